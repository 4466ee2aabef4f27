use crate::enums::{OrderSide, OrderType};
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One observation of the market for a single symbol, taken from a single
/// best-bid-ask response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub symbol: String,
    pub mid_price: f64,
    /// Ask price inclusive of the buy spread.
    pub ask_price: f64,
    /// Bid price inclusive of the sell spread.
    pub bid_price: f64,
    pub timestamp: DateTime<Utc>,
}

impl PriceSnapshot {
    /// The degraded snapshot returned when a fetch fails.
    pub fn zeroed(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            mid_price: 0.0,
            ask_price: 0.0,
            bid_price: 0.0,
            timestamp: Utc::now(),
        }
    }

    /// A snapshot can only drive decisions when every price is a positive, finite number.
    pub fn is_usable(&self) -> bool {
        [self.mid_price, self.ask_price, self.bid_price]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
    }
}

/// A request to place a single order on the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub client_order_id: Uuid,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    /// Only meaningful for `OrderType::Limit`.
    pub limit_price: Option<Decimal>,
}

impl OrderRequest {
    /// Creates a market order with a freshly generated client order id.
    pub fn market(symbol: &str, side: OrderSide, quantity: Decimal) -> Self {
        Self {
            client_order_id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            side,
            order_type: OrderType::Market,
            quantity,
            limit_price: None,
        }
    }

    /// Creates a good-till-cancelled limit order.
    pub fn limit(symbol: &str, side: OrderSide, quantity: Decimal, limit_price: Decimal) -> Self {
        Self {
            client_order_id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            side,
            order_type: OrderType::Limit,
            quantity,
            limit_price: Some(limit_price),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.symbol.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "symbol".to_string(),
                "must not be empty".to_string(),
            ));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(CoreError::InvalidInput(
                "quantity".to_string(),
                format!("must be positive, got {}", self.quantity),
            ));
        }
        if self.order_type == OrderType::Limit {
            match self.limit_price {
                Some(price) if price > Decimal::ZERO => {}
                other => {
                    return Err(CoreError::InvalidInput(
                        "limit_price".to_string(),
                        format!("limit orders need a positive price, got {:?}", other),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Confirmation that an order was accepted, carrying the price the bot will treat as filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub client_order_id: Uuid,
    /// Exchange-side order id. `None` for simulated fills.
    pub order_id: Option<String>,
    pub symbol: String,
    pub side: OrderSide,
    pub price: f64,
    pub quantity: Decimal,
    pub timestamp: DateTime<Utc>,
    pub simulated: bool,
}
