//! # Linear Plugin
//!
//! An issue-tracker integration for conversational agent runtimes. Free-form
//! user messages ("create a bug for the login page", "delete ENG-123") are
//! interpreted into concrete tracker operations against a Linear workspace.
//!
//! ## Features
//!
//! - **Named Operations** - Ten stable operations (`create-issue`,
//!   `get-issue`, `search-issues`, ...) with a uniform result shape
//! - **LLM Interpretation** - A completion model turns natural language into
//!   structured intents, with a regex fallback when the model is unavailable
//!   or its output is unusable
//! - **Disambiguation** - Descriptive references that match several issues
//!   produce a candidate listing instead of guessing
//! - **Activity Ledger** - Every remote call is audited in a bounded
//!   in-memory log, queryable through its own operations
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use linear_plugin::{EnvSettings, OperationRequest, Plugin};
//!
//! # async fn example() -> linear_plugin::Result<()> {
//! // Reads LINEAR_API_KEY (and optional defaults) from the environment and
//! // validates the credential before returning.
//! let plugin = Plugin::from_settings(&EnvSettings, None).await?;
//!
//! let request = OperationRequest::new("show me ENG-123");
//! let result = plugin.handle("get-issue", &request).await;
//! println!("{}", result.text.unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod activity;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod operations;
pub mod prompts;
pub mod service;

pub use activity::{ActivityFilter, ActivityItem, ActivityLedger, ResourceType};
pub use config::{EnvSettings, PluginConfig, SettingsProvider};
pub use error::{PluginError, Result};
pub use interpreter::{Interpretation, Interpreter, Resolution};
pub use operations::{OperationRequest, OperationResult, Plugin, Responder, OPERATION_NAMES};
pub use service::LinearService;
