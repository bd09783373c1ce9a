use thiserror::Error;

/// Errors that can occur while talking to the recipe backend or managing client state
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level failure (connection refused, timeout, body read)
    #[error("Failed to fetch: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Backend answered with a non-success status code
    #[error("Network response was not ok. Status: {status}, Details: {body}")]
    Status { status: u16, body: String },

    /// The request was cancelled by a newer action before it finished
    #[error("Request was cancelled")]
    Cancelled,

    /// The generation endpoint reported a failure
    #[error("{0}")]
    Generation(String),

    /// Response payload could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Reading or writing the last-viewed file failed
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Caller passed something unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    /// Cancellation is not a failure: callers skip state updates instead of reporting it
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}
