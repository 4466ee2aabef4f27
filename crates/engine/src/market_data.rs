use crate::audit::AuditTrail;
use crate::error::FailureKind;
use api_client::ApiClient;
use chrono::Utc;
use core_types::PriceSnapshot;
use std::sync::Arc;

pub const MISSING_PRICE_MESSAGE: &str = "Error: 'price' not found in response";
pub const MISSING_BUYING_POWER_MESSAGE: &str = "Error: 'buying_power' not found in account info";

/// Fetches price snapshots and buying power for a single symbol.
///
/// Neither fetch fails to the caller. Failures are recorded through the
/// `AuditTrail` and a degraded value is returned instead: a zeroed snapshot, or
/// the last buying power that was successfully read.
pub struct SnapshotFetcher {
    api_client: Arc<dyn ApiClient>,
    symbol: String,
    audit: AuditTrail,
    last_buying_power: f64,
}

impl SnapshotFetcher {
    pub fn new(api_client: Arc<dyn ApiClient>, symbol: &str, audit: AuditTrail) -> Self {
        Self {
            api_client,
            symbol: symbol.to_string(),
            audit,
            last_buying_power: 0.0,
        }
    }

    /// One best-bid-ask call. Returns `PriceSnapshot::zeroed` on any failure.
    pub async fn fetch_price(&self) -> PriceSnapshot {
        match self.api_client.get_best_bid_ask(&[self.symbol.as_str()]).await {
            Ok(quotes) => match quotes.into_iter().next() {
                Some(quote) => PriceSnapshot {
                    symbol: quote.symbol,
                    mid_price: quote.price,
                    ask_price: quote.ask_inclusive_of_buy_spread,
                    bid_price: quote.bid_inclusive_of_sell_spread,
                    timestamp: Utc::now(),
                },
                None => {
                    self.audit
                        .record_error(FailureKind::MalformedResponse, MISSING_PRICE_MESSAGE)
                        .await;
                    PriceSnapshot::zeroed(&self.symbol)
                }
            },
            Err(e) => {
                let kind = FailureKind::from_api_error(&e);
                let message = match kind {
                    FailureKind::MalformedResponse => MISSING_PRICE_MESSAGE.to_string(),
                    _ => format!("Error fetching price for {}: {}", self.symbol, e),
                };
                self.audit.record_error(kind, &message).await;
                PriceSnapshot::zeroed(&self.symbol)
            }
        }
    }

    /// Reads the account's buying power and publishes it to the status record.
    pub async fn fetch_buying_power(&mut self) -> f64 {
        match self.api_client.get_account().await {
            Ok(account) => match account.buying_power {
                Some(buying_power) => {
                    self.last_buying_power = buying_power;
                    self.audit
                        .status()
                        .update(|status| status.buying_power = buying_power);
                }
                None => {
                    self.audit
                        .record_error(FailureKind::MalformedResponse, MISSING_BUYING_POWER_MESSAGE)
                        .await;
                }
            },
            Err(e) => {
                let kind = FailureKind::from_api_error(&e);
                let message = match kind {
                    FailureKind::MalformedResponse => MISSING_BUYING_POWER_MESSAGE.to_string(),
                    _ => format!("Error fetching account info: {}", e),
                };
                self.audit.record_error(kind, &message).await;
            }
        }
        self.last_buying_power
    }
}
