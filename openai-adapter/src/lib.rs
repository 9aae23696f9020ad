//! OpenAI-compatible chat-completions collaborator for the `outform` engine.
//!
//! One request type, one response field: the client sends a system/user
//! prompt pair and hands back `choices[0].message.content` untouched. Repair,
//! validation, and retries all belong to the engine; this crate only carries
//! text across the wire.

/// Error types returned by the chat client.
pub mod error;

mod types;

use std::time::Duration;

use async_trait::async_trait;
use outform::{ModelClient, TransportError};
use tracing::debug;

use crate::error::OpenAiError;
use crate::types::{ChatRequest, ChatResponse, Message};

/// Default chat-completions endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Configuration for an OpenAI-compatible chat client.
///
/// Any server speaking the chat-completions protocol works; point
/// `endpoint` at it and supply whatever bearer token it expects.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Bearer token sent with every request.
    pub api_key: String,
    /// Chat-completions URL.
    pub endpoint: String,
    /// Per-request timeout.
    ///
    /// Default: 120 seconds.
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Creates a configuration for the default endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Points the client at a different chat-completions URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP client implementing the engine's [`ModelClient`] boundary.
pub struct OpenAiClient {
    config: OpenAiConfig,
    http: reqwest::Client,
}

impl OpenAiClient {
    /// Builds a client with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns `OpenAiError::Http` if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: OpenAiConfig) -> Result<Self, OpenAiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, http })
    }

    async fn chat(
        &self,
        model: &str,
        temperature: f32,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, OpenAiError> {
        let request = ChatRequest {
            model: model.to_string(),
            temperature,
            messages: vec![
                Message {
                    role: "system",
                    content: system_prompt.to_string(),
                },
                Message {
                    role: "user",
                    content: user_prompt.to_string(),
                },
            ],
        };

        debug!(model, temperature, endpoint = %self.config.endpoint, "sending chat request");
        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(OpenAiError::Api {
                status: status.as_u16(),
                body: truncate(&body, 400).to_string(),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|err| OpenAiError::MalformedResponse(err.to_string()))?;

        // A missing or empty content string is passed through as-is; the
        // engine treats it like any other unusable response.
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn invoke(
        &self,
        model: &str,
        temperature: f32,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, TransportError> {
        self.chat(model, temperature, system_prompt, user_prompt)
            .await
            .map_err(|err| TransportError(err.to_string()))
    }
}

/// Truncates a string for error display without splitting a character.
fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
