//! Chat-completion HTTP client
//!
//! Sends the full conversation history to a hosted chat-completions
//! endpoint and extracts the first choice's reply text.

use crate::completion::config::CompletionConfig;
use crate::messages::{Message, Role};
use crate::{AiConnectError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One turn of conversation history as the endpoint expects it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
    repetition_penalty: f32,
    stop: &'a [String],
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Completion client wrapping reqwest
pub struct CompletionClient {
    config: CompletionConfig,
    client: reqwest::Client,
}

impl CompletionClient {
    /// Create a new completion client with the given configuration
    pub fn new(config: CompletionConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            client: reqwest::Client::new(),
        })
    }

    /// Request one assistant reply for the given conversation history
    pub async fn complete(&self, history: &[ChatTurn]) -> Result<String> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let payload = ChatCompletionRequest {
            model: &self.config.model,
            messages: history,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            top_k: self.config.top_k,
            repetition_penalty: self.config.repetition_penalty,
            stop: &self.config.stop,
        };

        debug!("Requesting completion for {} turns", history.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AiConnectError::CompletionError(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AiConnectError::CompletionError(format!("Malformed response: {}", e)))?;

        let content = completion
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| {
                AiConnectError::CompletionError("Response contained no choices".into())
            })?;

        debug!("Completion received: {} chars", content.len());

        Ok(content)
    }

    /// Get the model identifier
    pub fn model(&self) -> &str {
        &self.config.model
    }
}
