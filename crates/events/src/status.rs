use chrono::{DateTime, Utc};
use core_types::{PositionState, PriceSnapshot};
use serde::{Deserialize, Serialize};

/// Everything the dashboard shows about the bot.
///
/// Fields are overwritten independently as the tick progresses; a reader may
/// observe a mix of the previous and current tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusRecord {
    pub buying_power: f64,
    pub current_price: f64,
    pub ask_price: f64,
    pub bid_price: f64,
    pub baseline_price: f64,
    /// The rule that fired (or is being waited on) on the latest tick.
    pub last_action: String,
    /// Free-form progress or error text.
    pub message: String,
    pub position: PositionState,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StatusRecord {
    /// Copies the three observed prices from a snapshot.
    pub fn apply_prices(&mut self, snapshot: &PriceSnapshot) {
        self.current_price = snapshot.mid_price;
        self.ask_price = snapshot.ask_price;
        self.bid_price = snapshot.bid_price;
    }
}
