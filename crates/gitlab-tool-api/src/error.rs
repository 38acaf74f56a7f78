//! Hosting API error types

use thiserror::Error;

/// Result type for hosting API calls
pub type Result<T> = std::result::Result<T, FetchError>;

/// Errors raised while fetching from the hosting platform
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status returned by the API
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The caller's deadline expired before the request finished
    #[error("Deadline expired while fetching {0}")]
    Timeout(String),

    /// The configured server URL cannot be turned into an API URL
    #[error("Invalid GitLab URL: {0}")]
    InvalidUrl(String),

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// HTTP status for API errors, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
