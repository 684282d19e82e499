//! Remote completion client for Anthropic-style messages APIs.

use crate::config::CompletionConfig;
use crate::error::{CompletionError, Result};
use crate::CompletionModel;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client for a messages-style completion endpoint.
///
/// Sends the prompt as a single user turn and returns the concatenated text
/// blocks of the reply.
#[derive(Clone)]
pub struct MessagesClient {
    config: CompletionConfig,
    client: Client,
}

impl MessagesClient {
    /// Create a new client with the given configuration.
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(CompletionError::Http)?;

        Ok(Self { config, client })
    }

    fn extract_text(response: MessagesResponse) -> String {
        response
            .content
            .iter()
            .filter_map(|block| {
                if block.content_type == "text" {
                    block.text.clone()
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[async_trait]
impl CompletionModel for MessagesClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/messages", self.config.base_url);

        let req_body = MessagesRequest {
            model: self.config.model.clone(),
            messages: vec![MessageTurn {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.config.max_tokens,
        };

        tracing::debug!(model = %self.config.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&req_body)
            .send()
            .await
            .map_err(CompletionError::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(if status.as_u16() == 401 {
                CompletionError::Authentication(error_text)
            } else if status.as_u16() == 429 {
                CompletionError::RateLimited(error_text)
            } else {
                CompletionError::Provider(format!("API error {}: {}", status, error_text))
            });
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        Ok(Self::extract_text(body))
    }
}

// Messages API types
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    messages: Vec<MessageTurn>,
    max_tokens: usize,
}

#[derive(Debug, Serialize)]
struct MessageTurn {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}
