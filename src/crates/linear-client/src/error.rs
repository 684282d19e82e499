//! Error types for tracker API calls.

use thiserror::Error;

/// Result type for tracker operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when calling the tracker API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the credential.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The API reported an error for an otherwise successful request.
    #[error("API error: {0}")]
    Api(String),

    /// Response body did not match the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ClientError {
    /// Check if this error means the credential itself is bad.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ClientError::Authentication(_))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::InvalidResponse(err.to_string())
    }
}
