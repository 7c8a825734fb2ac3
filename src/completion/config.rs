//! Configuration for the hosted chat-completion endpoint

use crate::{AiConnectError, Result};

/// Default completion API base URL (Together-compatible)
pub const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.together.xyz/v1";

/// Default completion model
pub const DEFAULT_COMPLETION_MODEL: &str = "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo";

/// Configuration for the completion client
#[derive(Clone, Debug)]
pub struct CompletionConfig {
    /// Base URL of the completions API (the client appends `/chat/completions`)
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Bearer credential, injected by the caller
    pub api_key: String,

    /// Maximum output tokens per reply
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Nucleus-sampling top-p
    pub top_p: f32,

    /// Top-k sampling cutoff
    pub top_k: u32,

    /// Repetition penalty
    pub repetition_penalty: f32,

    /// Stop sequences
    pub stop: Vec<String>,

    /// Maximum queue size for pending requests
    pub queue_size: usize,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COMPLETION_BASE_URL.to_string(),
            model: DEFAULT_COMPLETION_MODEL.to_string(),
            api_key: String::new(),
            max_tokens: 512,
            temperature: 0.7,
            top_p: 0.7,
            top_k: 50,
            repetition_penalty: 1.0,
            stop: vec!["<|eot_id|>".to_string(), "<|eom_id|>".to_string()],
            queue_size: 100,
        }
    }
}

impl CompletionConfig {
    /// Create a new config with the given credential
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Set the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the model identifier
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the maximum output tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(AiConnectError::ConfigError(
                "Completion base URL is required".into(),
            ));
        }
        if self.model.is_empty() {
            return Err(AiConnectError::ConfigError(
                "Completion model is required".into(),
            ));
        }
        if self.api_key.is_empty() {
            return Err(AiConnectError::ConfigError(
                "Completion API key is required".into(),
            ));
        }
        Ok(())
    }
}
