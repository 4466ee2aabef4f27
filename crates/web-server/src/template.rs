use events::StatusRecord;

/// Escapes text for use inside HTML element content.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the status page. The embedded script refreshes every field from
/// `/status` every five seconds using `textContent`, so no markup is injected.
pub fn render_dashboard(symbol: &str, status: &StatusRecord) -> String {
    let symbol = escape_html(symbol);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Swing Trading Bot</title>
</head>
<body>
    <h1>{symbol} swing trading bot status</h1>
    <p>Buying Power: $<span id="buying_power">{buying_power}</span></p>
    <p>Current Price: $<span id="current_price">{current_price}</span></p>
    <p>Ask Price: $<span id="ask_price">{ask_price}</span></p>
    <p>Bid Price: $<span id="bid_price">{bid_price}</span></p>
    <p>Baseline Price: $<span id="baseline_price">{baseline_price}</span></p>
    <p>Position: <span id="position">{position}</span></p>
    <p>Last Action: <span id="last_action">{last_action}</span></p>
    <p>Message: <span id="message">{message}</span></p>
    <script>
        const fields = ["buying_power", "current_price", "ask_price", "bid_price",
                        "baseline_price", "position", "last_action", "message"];
        setInterval(() => {{
            fetch('/status')
                .then(response => response.json())
                .then(data => {{
                    for (const field of fields) {{
                        document.getElementById(field).textContent = data[field];
                    }}
                }})
                .catch(() => {{}});
        }}, 5000);
    </script>
</body>
</html>
"#,
        symbol = symbol,
        buying_power = status.buying_power,
        current_price = status.current_price,
        ask_price = status.ask_price,
        bid_price = status.bid_price,
        baseline_price = status.baseline_price,
        position = status.position,
        last_action = escape_html(&status.last_action),
        message = escape_html(&status.message),
    )
}
