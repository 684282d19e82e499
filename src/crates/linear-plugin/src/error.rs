//! Error types for the plugin.
//!
//! The taxonomy mirrors how failures propagate: configuration and
//! authentication errors abort construction outright, API errors are caught
//! at the operation boundary and converted into failure results, and
//! interpretation problems never become errors at all (they are user-facing
//! replies).

use completion::CompletionError;
use linear_client::ClientError;
use thiserror::Error;

/// Result type alias for plugin operations.
pub type Result<T> = std::result::Result<T, PluginError>;

/// Main error type for plugin operations.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Required configuration is missing or malformed. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The tracker rejected the credential. Fatal for the whole service.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// A remote tracker call failed.
    #[error("Tracker API error: {0}")]
    Api(String),

    /// The completion capability failed outright (not merely unusable
    /// output, which the interpreter recovers from).
    #[error("Completion error: {0}")]
    Completion(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<ClientError> for PluginError {
    fn from(err: ClientError) -> Self {
        if err.is_auth_error() {
            PluginError::Authentication(err.to_string())
        } else {
            PluginError::Api(err.to_string())
        }
    }
}

impl From<CompletionError> for PluginError {
    fn from(err: CompletionError) -> Self {
        PluginError::Completion(err.to_string())
    }
}
