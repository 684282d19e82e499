//! Plugin configuration sourced from the hosting runtime's settings.

use crate::error::{PluginError, Result};
use serde::{Deserialize, Serialize};

/// Setting key for the required API credential.
pub const API_KEY_SETTING: &str = "LINEAR_API_KEY";

/// Setting key for the optional workspace scope.
pub const WORKSPACE_ID_SETTING: &str = "LINEAR_WORKSPACE_ID";

/// Setting key for the optional default team, e.g. "ENG".
pub const DEFAULT_TEAM_SETTING: &str = "LINEAR_DEFAULT_TEAM_KEY";

/// Key/value settings lookup supplied by the hosting agent runtime.
pub trait SettingsProvider: Send + Sync {
    /// Fetch a setting by key; `None` when absent or empty.
    fn get(&self, key: &str) -> Option<String>;
}

/// Environment-backed settings, the default outside a hosting runtime.
#[derive(Debug, Clone, Default)]
pub struct EnvSettings;

impl SettingsProvider for EnvSettings {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Resolved plugin configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// API credential. Required; construction fails without it.
    pub api_key: String,

    /// Optional workspace scoping value.
    pub workspace_id: Option<String>,

    /// Optional team key applied to create/search/list operations unless the
    /// caller names another team or explicitly asks for "all".
    pub default_team_key: Option<String>,
}

impl PluginConfig {
    /// Create a configuration with just the credential.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            workspace_id: None,
            default_team_key: None,
        }
    }

    /// Resolve configuration from a settings provider.
    ///
    /// Fails with a configuration error when the credential is missing; the
    /// caller must not construct any further state in that case.
    pub fn from_settings(settings: &dyn SettingsProvider) -> Result<Self> {
        let api_key = settings.get(API_KEY_SETTING).ok_or_else(|| {
            PluginError::Config(format!("required setting {} is missing", API_KEY_SETTING))
        })?;

        Ok(Self {
            api_key,
            workspace_id: settings.get(WORKSPACE_ID_SETTING),
            default_team_key: settings.get(DEFAULT_TEAM_SETTING),
        })
    }

    /// Set the workspace scope.
    pub fn with_workspace(mut self, workspace_id: impl Into<String>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }

    /// Set the default team key.
    pub fn with_default_team(mut self, key: impl Into<String>) -> Self {
        self.default_team_key = Some(key.into());
        self
    }
}
