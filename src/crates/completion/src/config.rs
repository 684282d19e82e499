//! Configuration for remote completion providers.

use crate::error::{CompletionError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a remote completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// API key for authentication.
    pub api_key: String,

    /// Base URL for the API, e.g. "https://api.anthropic.com".
    pub base_url: String,

    /// Model name/identifier.
    pub model: String,

    /// Request timeout duration.
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// Maximum tokens to request per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

impl CompletionConfig {
    /// Create a new completion configuration.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            timeout: default_timeout(),
            max_tokens: default_max_tokens(),
        }
    }

    /// Create configuration with the key read from an environment variable.
    pub fn from_env(
        env_var: &str,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let api_key = std::env::var(env_var).map_err(|_| {
            CompletionError::ApiKeyNotFound(format!("Environment variable: {}", env_var))
        })?;

        Ok(Self::new(api_key, base_url, model))
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum completion length in tokens.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_max_tokens() -> usize {
    1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = CompletionConfig::new("test-key", "https://api.anthropic.com", "claude-3")
            .with_timeout(Duration::from_secs(30))
            .with_max_tokens(512);

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, "https://api.anthropic.com");
        assert_eq!(config.model, "claude-3");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_tokens, 512);
    }

    #[test]
    fn test_from_env_missing_key() {
        let result =
            CompletionConfig::from_env("COMPLETION_TEST_UNSET_VAR", "https://example.com", "m");
        assert!(matches!(result, Err(CompletionError::ApiKeyNotFound(_))));
    }
}
