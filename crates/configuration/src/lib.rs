use crate::error::ConfigError;
use config::{Environment, File, FileFormat};
use rust_decimal::Decimal;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    Config, DashboardConfig, DatabaseConfig, ExchangeConfig, LoggingConfig, TradingParams,
    MAX_POLL_INTERVAL_SECS, MIN_POLL_INTERVAL_SECS,
};

/// Prefix for environment overrides, e.g. `SWINGBOT__EXCHANGE__API_KEY`.
pub const ENV_PREFIX: &str = "SWINGBOT";

/// Loads the application configuration.
///
/// Sources are layered in order: built-in defaults, the TOML file at `path`
/// (optional, so a pure environment setup works), then `SWINGBOT__*` environment
/// variables. The result is validated before it is returned.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(File::from(path).format(FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;
    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Parses a configuration from TOML text alone, without consulting the environment.
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let config = config::Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?
        .try_deserialize::<Config>()?;
    validate(&config)?;
    Ok(config)
}

/// Checks the trading parameters for values the state machine cannot work with.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let trading = &config.trading;

    if trading.symbol.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "trading.symbol must not be empty".to_string(),
        ));
    }
    if !(trading.price_dip.is_finite() && trading.price_dip > 0.0) {
        return Err(ConfigError::ValidationError(format!(
            "trading.price_dip must be greater than 0, got {}",
            trading.price_dip
        )));
    }
    if !(trading.price_increase_offset.is_finite() && trading.price_increase_offset > 0.0) {
        return Err(ConfigError::ValidationError(format!(
            "trading.price_increase_offset must be greater than 0, got {}",
            trading.price_increase_offset
        )));
    }
    if trading.trade_quantity <= Decimal::ZERO {
        return Err(ConfigError::ValidationError(format!(
            "trading.trade_quantity must be greater than 0, got {}",
            trading.trade_quantity
        )));
    }
    if !(MIN_POLL_INTERVAL_SECS..=MAX_POLL_INTERVAL_SECS).contains(&trading.poll_interval_secs) {
        return Err(ConfigError::ValidationError(format!(
            "trading.poll_interval_secs must be between {} and {}, got {}",
            MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS, trading.poll_interval_secs
        )));
    }
    if trading.baseline_reset_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "trading.baseline_reset_interval_secs must be greater than 0".to_string(),
        ));
    }
    if config.exchange.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "exchange.request_timeout_secs must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// Ensures both exchange secrets are present. Only commands that talk to the exchange call this.
pub fn require_credentials(exchange: &ExchangeConfig) -> Result<(), ConfigError> {
    if exchange.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "exchange.api_key is not set (use {}__EXCHANGE__API_KEY)",
            ENV_PREFIX
        )));
    }
    if exchange.private_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "exchange.private_key is not set (use {}__EXCHANGE__PRIVATE_KEY)",
            ENV_PREFIX
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    #[test]
    fn empty_document_uses_defaults() {
        let config = parse_config("").unwrap();

        assert_eq!(config.trading.symbol, "BTC-USD");
        assert_eq!(config.trading.price_dip, 5.0);
        assert_eq!(config.trading.price_increase_offset, 7.5);
        assert_eq!(config.trading.trade_quantity, dec!(0.001));
        assert_eq!(config.trading.poll_interval(), Duration::from_millis(3600));
        assert_eq!(config.trading.baseline_reset_interval(), Duration::from_secs(1800));
        assert!(!config.trading.dry_run);
        assert_eq!(config.exchange.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.dashboard.bind_addr.port(), 5000);
        assert_eq!(config.database.url, "sqlite://trading_logs.db");
    }

    #[test]
    fn values_from_toml_override_defaults() {
        let config = parse_config(
            r#"
            [exchange]
            base_url = "http://127.0.0.1:9999"
            api_key = "key"
            private_key = "c2VjcmV0"

            [trading]
            symbol = "ETH-USD"
            price_dip = 2.5
            price_increase_offset = 4
            trade_quantity = "0.25"
            poll_interval_secs = 1.5
            baseline_reset_interval_secs = 600
            dry_run = true

            [dashboard]
            enabled = false
            bind_addr = "127.0.0.1:8080"
            "#,
        )
        .unwrap();

        assert_eq!(config.exchange.base_url, "http://127.0.0.1:9999");
        assert_eq!(config.trading.symbol, "ETH-USD");
        assert_eq!(config.trading.price_increase_offset, 4.0);
        assert_eq!(config.trading.trade_quantity, dec!(0.25));
        assert_eq!(config.trading.poll_interval(), Duration::from_millis(1500));
        assert!(config.trading.dry_run);
        assert!(!config.dashboard.enabled);
        assert!(require_credentials(&config.exchange).is_ok());
    }

    #[test]
    fn rejects_non_positive_parameters() {
        let err = parse_config("[trading]\nprice_dip = 0").unwrap_err();
        assert!(err.to_string().contains("price_dip"));

        let err = parse_config("[trading]\ntrade_quantity = \"-1\"").unwrap_err();
        assert!(err.to_string().contains("trade_quantity"));

        let err = parse_config("[trading]\nbaseline_reset_interval_secs = 0").unwrap_err();
        assert!(err.to_string().contains("baseline_reset_interval_secs"));
    }

    #[test]
    fn poll_interval_must_stay_within_bounds() {
        for bad in ["0", "0.0000000001", "86401", "1e300"] {
            let err = parse_config(&format!("[trading]\npoll_interval_secs = {}", bad)).unwrap_err();
            assert!(err.to_string().contains("poll_interval_secs"), "{} accepted", bad);
        }

        let config = parse_config("[trading]\npoll_interval_secs = 0.001").unwrap();
        assert_eq!(config.trading.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn poll_interval_never_yields_a_zero_or_overflowing_period() {
        let mut params = TradingParams::default();
        params.poll_interval_secs = 1e-12;
        assert_eq!(params.poll_interval(), Duration::from_millis(1));

        params.poll_interval_secs = f64::MAX;
        assert_eq!(params.poll_interval(), Duration::from_secs(86_400));

        params.poll_interval_secs = f64::NAN;
        assert_eq!(params.poll_interval(), Duration::from_millis(3600));
    }

    #[test]
    fn missing_credentials_are_reported() {
        let config = parse_config("").unwrap();
        let err = require_credentials(&config.exchange).unwrap_err();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = parse_config("[exchange]\napi_key = \"very-secret\"").unwrap();
        let rendered = format!("{:?}", config.exchange);
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
