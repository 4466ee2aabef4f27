use crate::error::StrategyError;
use crate::state::{BaselineState, Decision, Evaluation};
use chrono::{DateTime, TimeDelta, Utc};
use configuration::TradingParams;
use core_types::{Execution, OrderRequest, OrderSide, PositionState, PriceSnapshot};
use rust_decimal::Decimal;

/// Buys a fixed quantity when the ask drops `price_dip` dollars below the
/// baseline, then sells it once the bid rises `price_increase_offset` dollars
/// above the buy fill.
#[derive(Debug, Clone)]
pub struct SwingStrategy {
    symbol: String,
    price_dip: f64,
    price_increase_offset: f64,
    trade_quantity: Decimal,
    reset_after: TimeDelta,
    state: BaselineState,
}

impl SwingStrategy {
    /// Anchors the baseline at the snapshot's mid price, flat, with the trade
    /// clock starting at `now`.
    pub fn new(
        params: &TradingParams,
        initial: &PriceSnapshot,
        now: DateTime<Utc>,
    ) -> Result<Self, StrategyError> {
        if !(params.price_dip > 0.0 && params.price_increase_offset > 0.0) {
            return Err(StrategyError::InvalidParameters(
                "price_dip and price_increase_offset must be positive".to_string(),
            ));
        }
        if params.trade_quantity <= Decimal::ZERO {
            return Err(StrategyError::InvalidParameters(
                "trade_quantity must be positive".to_string(),
            ));
        }
        if !initial.is_usable() {
            return Err(StrategyError::UnusableSnapshot);
        }
        let reset_after = TimeDelta::from_std(params.baseline_reset_interval())
            .map_err(|e| StrategyError::InvalidParameters(e.to_string()))?;

        Ok(Self {
            symbol: params.symbol.clone(),
            price_dip: params.price_dip,
            price_increase_offset: params.price_increase_offset,
            trade_quantity: params.trade_quantity,
            reset_after,
            state: BaselineState {
                baseline_price: initial.mid_price,
                last_trade_at: now,
                position: PositionState::Flat,
            },
        })
    }

    pub fn state(&self) -> &BaselineState {
        &self.state
    }

    /// Runs one tick of the state machine against `snapshot`.
    ///
    /// The only mutation performed here is the idle baseline reset; position
    /// changes wait for `on_execution`.
    pub fn evaluate(&mut self, snapshot: &PriceSnapshot, now: DateTime<Utc>) -> Evaluation {
        if !snapshot.is_usable() {
            tracing::debug!(symbol = %snapshot.symbol, "Skipping tick on unusable snapshot");
            return Evaluation::skip();
        }

        match self.state.position {
            PositionState::Flat => self.evaluate_flat(snapshot, now),
            PositionState::Long => Evaluation {
                baseline_reset: None,
                decision: self.evaluate_long(snapshot),
            },
        }
    }

    fn evaluate_flat(&mut self, snapshot: &PriceSnapshot, now: DateTime<Utc>) -> Evaluation {
        let mut baseline_reset = None;
        if now.signed_duration_since(self.state.last_trade_at) >= self.reset_after {
            self.state.baseline_price = snapshot.mid_price;
            self.state.last_trade_at = now;
            baseline_reset = Some(snapshot.mid_price);
            tracing::info!(baseline = snapshot.mid_price, "Baseline reset after idle interval");
        }

        let baseline = self.state.baseline_price;
        let decision = if snapshot.ask_price <= baseline - self.price_dip {
            Decision::Buy {
                order: OrderRequest::market(&self.symbol, OrderSide::Buy, self.trade_quantity),
                quoted_price: snapshot.ask_price,
                last_action: format!(
                    "Buy: ask_price ({}) <= baseline_price ({}) - PRICE_DIP ({})",
                    snapshot.ask_price, baseline, self.price_dip
                ),
            }
        } else {
            Decision::Hold { last_action: None }
        };

        Evaluation {
            baseline_reset,
            decision,
        }
    }

    fn evaluate_long(&self, snapshot: &PriceSnapshot) -> Decision {
        let baseline = self.state.baseline_price;
        let target = baseline + self.price_increase_offset;

        if snapshot.bid_price >= target {
            Decision::Sell {
                order: OrderRequest::market(&self.symbol, OrderSide::Sell, self.trade_quantity),
                quoted_price: snapshot.bid_price,
                last_action: format!(
                    "Sell: bid_price ({}) >= baseline_price ({}) + PRICE_INCREASE_OFFSET ({})",
                    snapshot.bid_price, baseline, self.price_increase_offset
                ),
            }
        } else {
            Decision::Hold {
                last_action: Some(format!(
                    "Sell: bid_price ({}) < baseline_price ({}) + PRICE_INCREASE_OFFSET ({})",
                    snapshot.bid_price, baseline, self.price_increase_offset
                )),
            }
        }
    }

    /// Commits a confirmed order: the fill becomes the new baseline and the
    /// position flips.
    pub fn on_execution(
        &mut self,
        execution: &Execution,
        now: DateTime<Utc>,
    ) -> Result<(), StrategyError> {
        let next = match (self.state.position, execution.side) {
            (PositionState::Flat, OrderSide::Buy) => PositionState::Long,
            (PositionState::Long, OrderSide::Sell) => PositionState::Flat,
            (position, side) => {
                return Err(StrategyError::UnexpectedExecution { side, position });
            }
        };

        self.state.baseline_price = execution.price;
        self.state.last_trade_at = now;
        self.state.position = next;
        tracing::info!(
            side = %execution.side,
            price = execution.price,
            position = %next,
            "Position updated"
        );
        Ok(())
    }
}
