//! Configuration for the session layer
//!
//! Composes the completion and TTS endpoint configurations. Credentials
//! are always injected, by the caller or from the environment, and never
//! embedded in source.

use crate::completion::CompletionConfig;
use crate::speech::tts::TTSConfig;
use crate::Result;
use std::env;

/// Environment variable names for injected configuration
pub const ENV_COMPLETION_URL: &str = "AICONNECT_COMPLETION_URL";
pub const ENV_COMPLETION_KEY: &str = "AICONNECT_COMPLETION_KEY";
pub const ENV_COMPLETION_MODEL: &str = "AICONNECT_COMPLETION_MODEL";
pub const ENV_TTS_URL: &str = "AICONNECT_TTS_URL";
pub const ENV_TTS_KEY: &str = "AICONNECT_TTS_KEY";
pub const ENV_TTS_VOICE: &str = "AICONNECT_TTS_VOICE";

/// Configuration for the complete session
#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
    /// Completion endpoint configuration
    pub completion: CompletionConfig,

    /// TTS endpoint configuration
    pub tts: TTSConfig,

    /// Whether to open the audio output device
    pub enable_audio_output: bool,
}

impl SessionConfig {
    /// Create a new configuration with both credentials
    pub fn new(completion_key: impl Into<String>, tts_key: impl Into<String>) -> Self {
        Self {
            completion: CompletionConfig::new(completion_key),
            tts: TTSConfig::new(tts_key),
            enable_audio_output: true,
        }
    }

    /// Build a configuration from environment variables.
    ///
    /// `AICONNECT_COMPLETION_KEY` and `AICONNECT_TTS_KEY` are required;
    /// the URL, model, and voice variables override the defaults.
    pub fn from_env() -> Self {
        let mut config = Self {
            enable_audio_output: true,
            ..Default::default()
        };

        if let Ok(url) = env::var(ENV_COMPLETION_URL) {
            config.completion.base_url = url;
        }
        if let Ok(key) = env::var(ENV_COMPLETION_KEY) {
            config.completion.api_key = key;
        }
        if let Ok(model) = env::var(ENV_COMPLETION_MODEL) {
            config.completion.model = model;
        }
        if let Ok(url) = env::var(ENV_TTS_URL) {
            config.tts.base_url = url;
        }
        if let Ok(key) = env::var(ENV_TTS_KEY) {
            config.tts.api_key = key;
        }
        if let Ok(voice) = env::var(ENV_TTS_VOICE) {
            config.tts.voice = voice;
        }

        config
    }

    /// Set the completion configuration
    pub fn with_completion(mut self, completion: CompletionConfig) -> Self {
        self.completion = completion;
        self
    }

    /// Set the TTS configuration
    pub fn with_tts(mut self, tts: TTSConfig) -> Self {
        self.tts = tts;
        self
    }

    /// Disable the audio output device (text-only playback state)
    pub fn without_audio_output(mut self) -> Self {
        self.enable_audio_output = false;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.completion.validate()?;
        self.tts.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_wires_credentials() {
        let config = SessionConfig::new("completion-key", "tts-key");
        assert_eq!(config.completion.api_key, "completion-key");
        assert_eq!(config.tts.api_key, "tts-key");
        assert!(config.enable_audio_output);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_both_credentials() {
        let config = SessionConfig::new("completion-key", "tts-key");
        assert!(config.clone().with_tts(TTSConfig::default()).validate().is_err());
        assert!(config
            .with_completion(CompletionConfig::default())
            .validate()
            .is_err());
    }

    #[test]
    fn test_builder() {
        let config = SessionConfig::new("a", "b").without_audio_output();
        assert!(!config.enable_audio_output);
    }
}
