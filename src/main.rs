use anyhow::Context;
use api_client::{ApiClient, CryptoTradingClient, OrderResponse, QuoteSide};
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use configuration::{load_config, require_credentials, Config, LoggingConfig};
use database::{connect, run_migrations, DbRepository};
use engine::LiveEngine;
use events::StatusPublisher;
use executor::{Executor, LiveExecutor, PaperExecutor};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use web_server::AppState;

/// The main entry point for the swing trading bot.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Secrets usually live in `.env`; a missing file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    // Flushes the file appender on drop, so it must outlive every command.
    let _guard = init_tracing(&config.logging)?;

    require_credentials(&config.exchange)?;
    let client: Arc<dyn ApiClient> = Arc::new(CryptoTradingClient::new(&config.exchange)?);

    match cli.command {
        Commands::Run(args) => handle_run(args, config, client).await,
        Commands::Account => handle_account(client.as_ref()).await,
        Commands::Holdings { assets } => handle_holdings(client.as_ref(), &assets).await,
        Commands::Pairs { symbols } => handle_pairs(client.as_ref(), &symbols).await,
        Commands::Quote(args) => handle_quote(client.as_ref(), &config, args).await,
        Commands::Orders => {
            let orders = client.get_orders().await?;
            print_orders(&orders);
            Ok(())
        }
        Commands::Order { id } => {
            let order = client.get_order(&id).await?;
            print_orders(std::slice::from_ref(&order));
            Ok(())
        }
        Commands::Cancel { id } => {
            let body = client.cancel_order(&id).await?;
            // The cancel endpoint's body is not guaranteed to be JSON.
            match serde_json::from_str::<serde_json::Value>(&body) {
                Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                Err(_) => println!("{}", body),
            }
            Ok(())
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A single-asset swing trading bot with a live dashboard.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Missing files are allowed.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the trading loop (and the dashboard, unless disabled).
    Run(RunArgs),
    /// Show the trading account and its buying power.
    Account,
    /// Show holdings, optionally filtered by asset code (e.g. BTC).
    Holdings { assets: Vec<String> },
    /// Show trading pairs, optionally filtered by symbol (e.g. BTC-USD).
    Pairs { symbols: Vec<String> },
    /// Estimate the price for one or more quantities.
    Quote(QuoteArgs),
    /// List orders.
    Orders,
    /// Show a single order.
    Order { id: String },
    /// Cancel an open order.
    Cancel { id: String },
}

#[derive(Args)]
struct RunArgs {
    /// Simulate fills at the quoted price instead of placing orders.
    #[arg(long)]
    dry_run: bool,
    /// Do not start the web dashboard.
    #[arg(long)]
    no_dashboard: bool,
}

#[derive(Args)]
struct QuoteArgs {
    /// Defaults to the configured trading symbol.
    #[arg(long)]
    symbol: Option<String>,
    #[arg(long, value_enum, default_value_t = SideArg::Both)]
    side: SideArg,
    /// Comma-separated quantities, e.g. `0.1,1,10`.
    #[arg(long, value_delimiter = ',', required = true)]
    quantity: Vec<Decimal>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SideArg {
    Bid,
    Ask,
    Both,
}

impl From<SideArg> for QuoteSide {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Bid => QuoteSide::Bid,
            SideArg::Ask => QuoteSide::Ask,
            SideArg::Both => QuoteSide::Both,
        }
    }
}

// ==============================================================================
// Logging
// ==============================================================================

/// Console logging always; a daily-rolling file as well when a directory is configured.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.filter))
        .with_context(|| format!("invalid log filter '{}'", logging.filter))?;

    let (file_layer, guard) = match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "swingbot.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

// ==============================================================================
// Command Handlers
// ==============================================================================

/// Wires the database, executor, dashboard and engine together and runs until Ctrl+C.
async fn handle_run(
    args: RunArgs,
    mut config: Config,
    client: Arc<dyn ApiClient>,
) -> anyhow::Result<()> {
    config.trading.dry_run |= args.dry_run;

    let pool = connect(&config.database.url, config.database.max_connections).await?;
    run_migrations(&pool).await?;
    let db_repo = DbRepository::new(pool);

    let executor: Arc<dyn Executor> = if config.trading.dry_run {
        tracing::warn!("Dry run enabled: orders will be simulated, not placed");
        Arc::new(PaperExecutor::new())
    } else {
        Arc::new(LiveExecutor::new(client.clone()))
    };

    let status = StatusPublisher::new();

    let server = if config.dashboard.enabled && !args.no_dashboard {
        let state = AppState {
            status: status.subscribe(),
            db_repo: db_repo.clone(),
            symbol: config.trading.symbol.clone(),
        };
        Some(tokio::spawn(web_server::run_server(
            config.dashboard.bind_addr,
            state,
        )))
    } else {
        None
    };

    tracing::info!(
        symbol = %config.trading.symbol,
        price_dip = config.trading.price_dip,
        price_increase_offset = config.trading.price_increase_offset,
        trade_quantity = %config.trading.trade_quantity,
        dry_run = config.trading.dry_run,
        "Starting swing trading bot"
    );

    let mut engine = LiveEngine::new(config.trading, client, executor, db_repo, status);

    let dashboard = async {
        match server {
            Some(handle) => match handle.await {
                Ok(result) => result,
                Err(e) => Err(e.into()),
            },
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        result = engine.run() => result?,
        result = dashboard => {
            result.context("dashboard stopped")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

async fn handle_account(client: &dyn ApiClient) -> anyhow::Result<()> {
    let account = client.get_account().await?;

    let mut table = new_table();
    table.set_header(vec!["Account", "Status", "Buying Power", "Currency"]);
    table.add_row(vec![
        Cell::new(text(&account.account_number)),
        Cell::new(text(&account.status)),
        Cell::new(number(account.buying_power)),
        Cell::new(text(&account.buying_power_currency)),
    ]);
    println!("{table}");
    Ok(())
}

async fn handle_holdings(client: &dyn ApiClient, assets: &[String]) -> anyhow::Result<()> {
    let assets: Vec<&str> = assets.iter().map(String::as_str).collect();
    let holdings = client.get_holdings(&assets).await?;

    let mut table = new_table();
    table.set_header(vec!["Asset", "Total", "Available"]);
    for holding in &holdings {
        table.add_row(vec![
            holding.asset_code.clone(),
            number(holding.total_quantity),
            number(holding.quantity_available_for_trading),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn handle_pairs(client: &dyn ApiClient, symbols: &[String]) -> anyhow::Result<()> {
    let symbols: Vec<&str> = symbols.iter().map(String::as_str).collect();
    let pairs = client.get_trading_pairs(&symbols).await?;

    let mut table = new_table();
    table.set_header(vec![
        "Symbol",
        "Status",
        "Min Order",
        "Max Order",
        "Asset Increment",
        "Quote Increment",
    ]);
    for pair in &pairs {
        table.add_row(vec![
            pair.symbol.clone(),
            text(&pair.status),
            number(pair.min_order_size),
            number(pair.max_order_size),
            number(pair.asset_increment),
            number(pair.quote_increment),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn handle_quote(client: &dyn ApiClient, config: &Config, args: QuoteArgs) -> anyhow::Result<()> {
    let symbol = args.symbol.as_deref().unwrap_or(&config.trading.symbol);
    let quotes = client
        .get_estimated_price(symbol, args.side.into(), &args.quantity)
        .await?;

    let mut table = new_table();
    table.set_header(vec!["Symbol", "Side", "Quantity", "Price", "Bid", "Ask"]);
    for quote in &quotes {
        table.add_row(vec![
            quote.symbol.clone(),
            quote.side.clone(),
            quote.quantity.to_string(),
            quote.price.to_string(),
            number(quote.bid_inclusive_of_sell_spread),
            number(quote.ask_inclusive_of_buy_spread),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn print_orders(orders: &[OrderResponse]) {
    let mut table = new_table();
    table.set_header(vec![
        "ID", "Symbol", "Side", "Type", "State", "Avg Price", "Filled", "Created",
    ]);
    for order in orders {
        let state = if order.is_rejected() {
            Cell::new(&order.state).fg(Color::Red)
        } else {
            Cell::new(&order.state)
        };
        table.add_row(vec![
            Cell::new(&order.id),
            Cell::new(text(&order.symbol)),
            Cell::new(order.side),
            Cell::new(text(&order.order_type)),
            state,
            Cell::new(number(order.average_price)),
            Cell::new(number(order.filled_asset_quantity)),
            Cell::new(text(&order.created_at)),
        ]);
    }
    println!("{table}");
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
