use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("API client error: {0}")]
    ApiClient(#[from] api_client::error::ApiError),

    #[error("Database error: {0}")]
    Database(#[from] database::DbError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] strategies::StrategyError),

    #[error("Execution error: {0}")]
    Executor(#[from] executor::ExecutorError),

    #[error("The engine has not been initialized with a baseline yet")]
    NotInitialized,
}

/// How a non-fatal failure inside a tick is classified in logs and the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transport failure, timeout or non-2xx status.
    NetworkFailure,
    /// A 2xx response that lacks the expected fields or cannot be decoded.
    MalformedResponse,
    /// The order was not accepted.
    OrderSubmissionFailure,
}

impl FailureKind {
    pub fn from_api_error(error: &api_client::error::ApiError) -> Self {
        match error {
            api_client::error::ApiError::Deserialization(_) => FailureKind::MalformedResponse,
            _ => FailureKind::NetworkFailure,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::NetworkFailure => "network_failure",
            FailureKind::MalformedResponse => "malformed_response",
            FailureKind::OrderSubmissionFailure => "order_submission_failure",
        };
        f.write_str(name)
    }
}
