use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error while calling the exchange: {0}")]
    Network(#[from] reqwest::Error),

    #[error("The exchange returned HTTP {status}: {body}")]
    Exchange { status: u16, body: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl ApiError {
    /// Transport failures: timeouts, refused or dropped connections.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    /// True when the exchange may have acted on the request even though no usable
    /// answer came back: a transport failure, a 5xx, or a 2xx body that would not decode.
    pub fn is_outcome_unknown(&self) -> bool {
        match self {
            ApiError::Exchange { status, .. } => *status >= 500,
            ApiError::Deserialization(_) => true,
            other => other.is_network(),
        }
    }
}
