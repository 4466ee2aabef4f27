use core_types::{OrderSide, PositionState};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum StrategyError {
    #[error("Strategy received invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Cannot initialize the baseline from an unusable snapshot")]
    UnusableSnapshot,

    #[error("Execution for a {side} order does not match position {position}")]
    UnexpectedExecution {
        side: OrderSide,
        position: PositionState,
    },
}
