//! Text-completion capability for the linear-agent plugin.
//!
//! The plugin's request interpreter needs exactly one primitive from a
//! language model: send a prompt, get back a string. This crate defines that
//! contract as the [`CompletionModel`] trait and provides a remote client for
//! Anthropic-style messages APIs.
//!
//! Hosting runtimes that already own an LLM connection implement
//! [`CompletionModel`] over it and hand the plugin a trait object; the bundled
//! [`remote::MessagesClient`] exists for deployments where the plugin talks to
//! the provider directly.
//!
//! # Example
//!
//! ```rust,ignore
//! use completion::{CompletionConfig, CompletionModel};
//! use completion::remote::MessagesClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CompletionConfig::from_env(
//!         "ANTHROPIC_API_KEY",
//!         "https://api.anthropic.com",
//!         "claude-3-5-haiku-latest",
//!     )?;
//!     let client = MessagesClient::new(config)?;
//!
//!     let reply = client.complete("Summarize this issue: ...").await?;
//!     println!("{reply}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod remote;

pub use config::CompletionConfig;
pub use error::{CompletionError, Result};

use async_trait::async_trait;

/// A single-shot prompt-to-text capability.
///
/// Implementations must be cheap to share behind an `Arc`; the plugin issues
/// one `complete` call per interpreted request.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Send one prompt and return the model's text reply.
    ///
    /// An empty or whitespace-only reply is valid at this layer; callers
    /// decide whether that counts as "capability unavailable".
    async fn complete(&self, prompt: &str) -> Result<String>;
}
