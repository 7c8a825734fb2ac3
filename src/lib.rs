pub mod audio;
pub mod completion;
pub mod messages;
pub mod session;
pub mod speech;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AiConnectError {
    #[error("Completion error: {0}")]
    CompletionError(String),

    #[error("TTS error: {0}")]
    TTSError(String),

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for AiConnectError {
    fn from(e: reqwest::Error) -> Self {
        AiConnectError::HttpError(e.to_string())
    }
}

impl AiConnectError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Hardware/device errors may require user intervention
            AiConnectError::AudioDeviceError(_) => false,
            // These are typically transient network errors
            AiConnectError::CompletionError(_) => true,
            AiConnectError::TTSError(_) => true,
            AiConnectError::HttpError(_) => true,
            AiConnectError::ConfigError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            AiConnectError::CompletionError(_) => {
                "AI response generation failed. Please try again.".to_string()
            }
            AiConnectError::TTSError(_) => {
                "Text-to-speech failed. Response will be shown as text.".to_string()
            }
            AiConnectError::AudioDeviceError(_) => {
                "Audio device error. Please check your speakers.".to_string()
            }
            AiConnectError::HttpError(_) => {
                "Network error occurred. Please try again.".to_string()
            }
            AiConnectError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AiConnectError>;
