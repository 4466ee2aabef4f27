use chrono::{DateTime, Utc};
use core_types::{OrderRequest, PositionState};
use serde::Serialize;

/// The state carried between ticks. Exactly one instance lives for the whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineState {
    /// Reference price for both the dip and the rise thresholds.
    pub baseline_price: f64,
    pub last_trade_at: DateTime<Utc>,
    pub position: PositionState,
}

/// What the engine should do on this tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The snapshot was unusable; nothing was compared or changed.
    Skip,
    /// No order this tick. `last_action` is set while waiting to sell.
    Hold { last_action: Option<String> },
    /// Submit `order`; on confirmation report the fill through `on_execution`.
    Buy {
        order: OrderRequest,
        quoted_price: f64,
        last_action: String,
    },
    Sell {
        order: OrderRequest,
        quoted_price: f64,
        last_action: String,
    },
}

impl Decision {
    pub fn order(&self) -> Option<&OrderRequest> {
        match self {
            Decision::Buy { order, .. } | Decision::Sell { order, .. } => Some(order),
            Decision::Skip | Decision::Hold { .. } => None,
        }
    }
}

/// The full outcome of one `evaluate` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// The new baseline when an idle reset happened on this tick.
    pub baseline_reset: Option<f64>,
    pub decision: Decision,
}

impl Evaluation {
    pub(crate) fn skip() -> Self {
        Self {
            baseline_reset: None,
            decision: Decision::Skip,
        }
    }
}
