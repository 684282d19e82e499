//! Error types for completion calls.

use thiserror::Error;

/// Result type for completion operations.
pub type Result<T> = std::result::Result<T, CompletionError>;

/// Errors that can occur when calling a completion provider.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API authentication failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// API key not found in the environment.
    #[error("API key not found: {0}")]
    ApiKeyNotFound(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Provider returned a malformed or unexpected body.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Any other provider-side failure.
    #[error("Provider error: {0}")]
    Provider(String),
}

impl CompletionError {
    /// Check if this error is due to authentication.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            CompletionError::Authentication(_) | CompletionError::ApiKeyNotFound(_)
        )
    }
}

impl From<serde_json::Error> for CompletionError {
    fn from(err: serde_json::Error) -> Self {
        CompletionError::InvalidResponse(err.to_string())
    }
}
