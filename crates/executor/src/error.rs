use api_client::error::ApiError;
use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Order {order_id} was not accepted (state: {state})")]
    Rejected { order_id: String, state: String },

    #[error("Refusing to submit an invalid order: {0}")]
    InvalidOrder(#[from] CoreError),
}

impl ExecutorError {
    /// An order that failed this way may still be live at the exchange and must be
    /// looked up before another one is sent.
    pub fn is_outcome_unknown(&self) -> bool {
        match self {
            ExecutorError::Api(e) => e.is_outcome_unknown(),
            ExecutorError::Rejected { .. } | ExecutorError::InvalidOrder(_) => false,
        }
    }
}
