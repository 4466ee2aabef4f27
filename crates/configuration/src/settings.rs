use rust_decimal::Decimal;
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

pub const MIN_POLL_INTERVAL_SECS: f64 = 0.001;
pub const MAX_POLL_INTERVAL_SECS: f64 = 86_400.0;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub trading: TradingParams,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection details and credentials for the exchange REST API.
#[derive(Clone, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    /// Base64-encoded Ed25519 private key. Only the first 32 decoded bytes are used.
    #[serde(default)]
    pub private_key: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ExchangeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            private_key: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for ExchangeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("private_key", &redact(&self.private_key))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}

/// Parameters of the swing-trading state machine, fixed at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct TradingParams {
    /// The single traded symbol (e.g., "BTC-USD").
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Absolute dollar drop below the baseline that triggers a buy.
    #[serde(default = "default_price_dip")]
    pub price_dip: f64,
    /// Absolute dollar rise above the buy baseline required before selling.
    #[serde(default = "default_price_increase_offset")]
    pub price_increase_offset: f64,
    /// Fixed asset quantity bought and sold on every trade.
    #[serde(default = "default_trade_quantity")]
    pub trade_quantity: Decimal,
    /// Delay between polls. 3.6s keeps the bot at 1000 requests per hour.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: f64,
    /// A flat bot that has not traded for this long re-anchors its baseline to the market.
    #[serde(default = "default_baseline_reset_interval_secs")]
    pub baseline_reset_interval_secs: u64,
    /// Simulate fills at the quoted price instead of placing real orders.
    #[serde(default)]
    pub dry_run: bool,
}

impl TradingParams {
    /// Clamped to `MIN_POLL_INTERVAL_SECS..=MAX_POLL_INTERVAL_SECS` so the timer never sees a zero period.
    pub fn poll_interval(&self) -> Duration {
        let secs = if self.poll_interval_secs.is_finite() {
            self.poll_interval_secs
                .clamp(MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS)
        } else {
            default_poll_interval_secs()
        };
        Duration::from_secs_f64(secs)
    }

    pub fn baseline_reset_interval(&self) -> Duration {
        Duration::from_secs(self.baseline_reset_interval_secs)
    }
}

impl Default for TradingParams {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            price_dip: default_price_dip(),
            price_increase_offset: default_price_increase_offset(),
            trade_quantity: default_trade_quantity(),
            poll_interval_secs: default_poll_interval_secs(),
            baseline_reset_interval_secs: default_baseline_reset_interval_secs(),
            dry_run: false,
        }
    }
}

/// Settings for the status dashboard.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_addr: default_bind_addr(),
        }
    }
}

/// Settings for the local audit-log database.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// When set, a daily-rolling log file is written to this directory as well.
    #[serde(default)]
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            directory: None,
        }
    }
}

fn default_base_url() -> String {
    "https://trading.robinhood.com".to_string()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_symbol() -> String {
    "BTC-USD".to_string()
}
fn default_price_dip() -> f64 {
    5.0
}
fn default_price_increase_offset() -> f64 {
    7.5
}
fn default_trade_quantity() -> Decimal {
    Decimal::new(1, 3)
}
fn default_poll_interval_secs() -> f64 {
    3.6
}
fn default_baseline_reset_interval_secs() -> u64 {
    30 * 60
}
fn default_true() -> bool {
    true
}
fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}
fn default_database_url() -> String {
    "sqlite://trading_logs.db".to_string()
}
fn default_max_connections() -> u32 {
    5
}
fn default_log_filter() -> String {
    "info".to_string()
}
