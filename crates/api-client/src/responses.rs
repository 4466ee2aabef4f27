use core_types::OrderSide;
use serde::{Deserialize, Deserializer};

// The exchange sends most numeric fields as JSON strings ("64123.50"), but not
// consistently, so every price and quantity goes through these helpers.

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

fn parse_number<E: serde::de::Error>(raw: NumberOrString) -> Result<f64, E> {
    match raw {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| E::custom(format!("invalid number {:?}: {}", s, e))),
    }
}

fn de_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    parse_number(NumberOrString::deserialize(deserializer)?)
}

fn de_opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::String(s)) if s.trim().is_empty() => Ok(None),
        Some(raw) => parse_number(raw).map(Some),
        None => Ok(None),
    }
}

/// The cursor-paginated envelope used by every list endpoint.
///
/// A body without `results` decodes to an empty list so that callers can tell
/// "no data" apart from a transport failure.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// `GET /api/v1/crypto/trading/accounts/`
#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub buying_power: Option<f64>,
    #[serde(default)]
    pub buying_power_currency: Option<String>,
}

/// One entry of `GET /api/v1/crypto/marketdata/best_bid_ask/`.
#[derive(Debug, Clone, Deserialize)]
pub struct BestBidAsk {
    pub symbol: String,
    #[serde(deserialize_with = "de_f64")]
    pub price: f64,
    #[serde(deserialize_with = "de_f64")]
    pub bid_inclusive_of_sell_spread: f64,
    #[serde(deserialize_with = "de_f64")]
    pub ask_inclusive_of_buy_spread: f64,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub sell_spread: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub buy_spread: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// One entry of `GET /api/v1/crypto/marketdata/estimated_price/`.
#[derive(Debug, Clone, Deserialize)]
pub struct EstimatedPrice {
    pub symbol: String,
    pub side: String,
    #[serde(deserialize_with = "de_f64")]
    pub price: f64,
    #[serde(deserialize_with = "de_f64")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub bid_inclusive_of_sell_spread: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub ask_inclusive_of_buy_spread: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// One entry of `GET /api/v1/crypto/trading/trading_pairs/`.
#[derive(Debug, Clone, Deserialize)]
pub struct TradingPair {
    pub symbol: String,
    #[serde(default)]
    pub asset_code: Option<String>,
    #[serde(default)]
    pub quote_code: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub quote_increment: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub asset_increment: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub min_order_size: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub max_order_size: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// One entry of `GET /api/v1/crypto/trading/holdings/`.
#[derive(Debug, Clone, Deserialize)]
pub struct Holding {
    pub asset_code: String,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub total_quantity: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub quantity_available_for_trading: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderExecution {
    #[serde(deserialize_with = "de_f64")]
    pub effective_price: f64,
    #[serde(deserialize_with = "de_f64")]
    pub quantity: f64,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// An order as returned by `POST /trading/orders/` and the order lookup endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub client_order_id: Option<String>,
    pub side: OrderSide,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(rename = "type", default)]
    pub order_type: Option<String>,
    /// One of `open`, `partially_filled`, `filled`, `canceled`, `failed`.
    pub state: String,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub average_price: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub filled_asset_quantity: Option<f64>,
    #[serde(default)]
    pub executions: Vec<OrderExecution>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl OrderResponse {
    /// Orders in these states will never fill.
    pub fn is_rejected(&self) -> bool {
        matches!(self.state.as_str(), "canceled" | "cancelled" | "failed")
    }
}
