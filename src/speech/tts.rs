//! Text-to-speech over a hosted synthesis endpoint
//!
//! The synthesis endpoint takes plain text and returns a raw binary audio
//! payload, which is carried through the pipeline as an opaque byte blob
//! tagged with the message it belongs to.

use crate::{AiConnectError, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::Serialize;
use std::thread::{self, JoinHandle};
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Default TTS API base URL (neets-compatible)
pub const DEFAULT_TTS_BASE_URL: &str = "https://api.neets.ai/v1";

/// Default voice identifier
pub const DEFAULT_TTS_VOICE: &str = "ariana-grande";

/// Default TTS model
pub const DEFAULT_TTS_MODEL: &str = "ar-diff-50k";

/// Configuration for the TTS client
#[derive(Clone, Debug)]
pub struct TTSConfig {
    /// Base URL of the synthesis API (the client appends `/tts`)
    pub base_url: String,

    /// Voice identifier
    pub voice: String,

    /// Model identifier
    pub model: String,

    /// API-key credential, injected by the caller
    pub api_key: String,

    /// Maximum queue size for pending TTS requests
    pub queue_size: usize,
}

impl Default for TTSConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TTS_BASE_URL.to_string(),
            voice: DEFAULT_TTS_VOICE.to_string(),
            model: DEFAULT_TTS_MODEL.to_string(),
            api_key: String::new(),
            queue_size: 100,
        }
    }
}

impl TTSConfig {
    /// Create a new TTS config with the given credential
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

    /// Set the voice identifier
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Set the model identifier
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(AiConnectError::ConfigError("TTS base URL is required".into()));
        }
        if self.voice.is_empty() {
            return Err(AiConnectError::ConfigError("TTS voice is required".into()));
        }
        if self.api_key.is_empty() {
            return Err(AiConnectError::ConfigError("TTS API key is required".into()));
        }
        Ok(())
    }
}

/// Synthesized audio from TTS
#[derive(Clone, Debug)]
pub struct TTSAudio {
    /// Raw audio payload as returned by the endpoint (opaque)
    pub bytes: Vec<u8>,

    /// The message this audio belongs to
    pub message_id: Uuid,
}

impl TTSAudio {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Command sent to the TTS pipeline
#[derive(Clone, Debug)]
pub enum TTSCommand {
    /// Synthesize speech for a message's text
    Synthesize {
        /// The text to speak
        text: String,
        /// Id of the message the audio will attach to
        message_id: Uuid,
    },

    /// Shutdown the pipeline
    Shutdown,
}

/// Event emitted by the TTS pipeline
#[derive(Clone, Debug)]
pub enum TTSEvent {
    /// Audio was successfully synthesized
    Audio(TTSAudio),

    /// An error occurred during synthesis
    Error {
        /// What went wrong
        error: AiConnectError,
        /// Message id if applicable
        message_id: Option<Uuid>,
    },

    /// Pipeline has shut down
    Shutdown,
}

#[derive(Serialize)]
struct TTSRequestParams<'a> {
    model: &'a str,
}

#[derive(Serialize)]
struct TTSRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
    params: TTSRequestParams<'a>,
}

/// TTS client wrapping reqwest
pub struct TTSClient {
    config: TTSConfig,
    client: reqwest::Client,
}

impl TTSClient {
    /// Create a new TTS client with the given configuration
    pub fn new(config: TTSConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            client: reqwest::Client::new(),
        })
    }

    /// Synthesize text into a raw audio payload
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/tts", self.config.base_url.trim_end_matches('/'));

        let payload = TTSRequest {
            text,
            voice_id: &self.config.voice,
            params: TTSRequestParams {
                model: &self.config.model,
            },
        };

        debug!("Synthesizing {} chars with voice {}", text.len(), self.config.voice);

        let response = self
            .client
            .post(&url)
            .header("X-API-Key", &self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AiConnectError::TTSError(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let bytes = response.bytes().await?;

        debug!("Synthesized {} bytes of audio", bytes.len());

        Ok(bytes.to_vec())
    }

    /// Get the configured voice
    pub fn voice(&self) -> &str {
        &self.config.voice
    }
}

/// First `limit` characters of `text`, safe at any byte position
fn preview(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// TTS pipeline with channel-based communication
pub struct TTSPipeline {
    /// Configuration
    config: TTSConfig,

    /// Command sender
    command_tx: Sender<TTSCommand>,

    /// Command receiver (for worker)
    command_rx: Receiver<TTSCommand>,

    /// Event sender (for worker)
    event_tx: Sender<TTSEvent>,

    /// Event receiver
    event_rx: Receiver<TTSEvent>,
}

impl TTSPipeline {
    /// Create a new TTS pipeline
    pub fn new(config: TTSConfig) -> Self {
        let (command_tx, command_rx) = bounded(config.queue_size);
        let (event_tx, event_rx) = bounded(config.queue_size);

        Self {
            config,
            command_tx,
            command_rx,
            event_tx,
            event_rx,
        }
    }

    /// Get a sender for commands
    pub fn command_sender(&self) -> Sender<TTSCommand> {
        self.command_tx.clone()
    }

    /// Get a receiver for events
    pub fn event_receiver(&self) -> Receiver<TTSEvent> {
        self.event_rx.clone()
    }

    /// Start the pipeline worker thread
    pub fn start_worker(self) -> Result<JoinHandle<()>> {
        let config = self.config.clone();
        let command_rx = self.command_rx.clone();
        let event_tx = self.event_tx.clone();

        let handle = thread::spawn(move || {
            info!("TTS pipeline worker starting");

            let runtime = match Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    error!("Failed to create tokio runtime: {}", e);
                    let _ = event_tx.send(TTSEvent::Error {
                        error: AiConnectError::TTSError(format!("Runtime creation failed: {}", e)),
                        message_id: None,
                    });
                    let _ = event_tx.send(TTSEvent::Shutdown);
                    return;
                }
            };

            let client = match TTSClient::new(config) {
                Ok(client) => client,
                Err(e) => {
                    error!("Failed to initialize TTS client: {}", e);
                    let _ = event_tx.send(TTSEvent::Error {
                        error: e,
                        message_id: None,
                    });
                    let _ = event_tx.send(TTSEvent::Shutdown);
                    return;
                }
            };

            info!("TTS pipeline worker ready");

            loop {
                match command_rx.recv() {
                    Ok(TTSCommand::Synthesize { text, message_id }) => {
                        debug!(
                            "Processing TTS for message {}: {}",
                            message_id,
                            preview(&text, 50)
                        );

                        match runtime.block_on(client.synthesize(&text)) {
                            Ok(bytes) if !bytes.is_empty() => {
                                let _ = event_tx.send(TTSEvent::Audio(TTSAudio {
                                    bytes,
                                    message_id,
                                }));
                            }
                            Ok(_) => {
                                warn!("TTS returned empty audio for message {}", message_id);
                                let _ = event_tx.send(TTSEvent::Error {
                                    error: AiConnectError::TTSError("Empty audio payload".into()),
                                    message_id: Some(message_id),
                                });
                            }
                            Err(e) => {
                                warn!("TTS synthesis failed for message {}: {}", message_id, e);
                                let recoverable = e.is_recoverable();
                                let _ = event_tx.send(TTSEvent::Error {
                                    error: e,
                                    message_id: Some(message_id),
                                });
                                if !recoverable {
                                    let _ = event_tx.send(TTSEvent::Shutdown);
                                    break;
                                }
                            }
                        }
                    }

                    Ok(TTSCommand::Shutdown) => {
                        info!("TTS pipeline worker shutting down");
                        let _ = event_tx.send(TTSEvent::Shutdown);
                        break;
                    }

                    Err(e) => {
                        error!("Command channel error: {}", e);
                        break;
                    }
                }
            }

            info!("TTS pipeline worker stopped");
        });

        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TTSConfig::default();
        assert_eq!(config.voice, DEFAULT_TTS_VOICE);
        assert_eq!(config.model, DEFAULT_TTS_MODEL);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = TTSConfig::new("key")
            .with_base_url("http://localhost:8080/v1")
            .with_voice("test-voice")
            .with_model("test-model");

        assert!(config.validate().is_ok());
        assert_eq!(config.voice, "test-voice");
    }

    #[test]
    fn test_request_body_shape() {
        let payload = TTSRequest {
            text: "Hello",
            voice_id: "test-voice",
            params: TTSRequestParams { model: "m1" },
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["text"], "Hello");
        assert_eq!(json["voice_id"], "test-voice");
        assert_eq!(json["params"]["model"], "m1");
    }

    #[test]
    fn test_pipeline_creation() {
        let pipeline = TTSPipeline::new(TTSConfig::default());
        let _cmd_tx = pipeline.command_sender();
        let _event_rx = pipeline.event_receiver();
    }

    #[test]
    fn test_worker_reports_bad_config() {
        let pipeline = TTSPipeline::new(TTSConfig::default());
        let event_rx = pipeline.event_receiver();
        let handle = pipeline.start_worker().unwrap();

        match event_rx.recv().unwrap() {
            TTSEvent::Error { error, message_id } => {
                assert!(matches!(error, AiConnectError::ConfigError(_)));
                assert!(error.to_string().contains("API key"));
                assert!(message_id.is_none());
            }
            other => panic!("Expected error event, got {:?}", other),
        }
        match event_rx.recv().unwrap() {
            TTSEvent::Shutdown => {}
            other => panic!("Expected shutdown event, got {:?}", other),
        }

        handle.join().unwrap();
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        // Char 50 starts mid-way through a multi-byte character
        let text = format!("{}é and some trailing text", "a".repeat(49));
        let cut = preview(&text, 50);
        assert_eq!(cut.chars().count(), 50);
        assert!(cut.ends_with('é'));

        assert_eq!(preview("short", 50), "short");
        assert_eq!(preview("héllo", 2), "hé");
        assert_eq!(preview("", 50), "");
    }

    #[test]
    fn test_worker_handles_multibyte_text() {
        // Log at debug so the request text actually gets formatted
        let _ = tracing_subscriber::fmt()
            .with_env_filter("aiconnect=debug")
            .try_init();

        let config = TTSConfig::new("key").with_base_url("http://127.0.0.1:1");
        let pipeline = TTSPipeline::new(config);
        let command_tx = pipeline.command_sender();
        let event_rx = pipeline.event_receiver();
        let handle = pipeline.start_worker().unwrap();

        let message_id = Uuid::new_v4();
        let text = format!("{}é and the rest of a longer reply", "a".repeat(49));
        command_tx
            .send(TTSCommand::Synthesize { text, message_id })
            .unwrap();

        // The worker must stay alive and report the failed request
        match event_rx.recv().unwrap() {
            TTSEvent::Error { message_id: id, .. } => assert_eq!(id, Some(message_id)),
            other => panic!("Expected error event, got {:?}", other),
        }

        command_tx.send(TTSCommand::Shutdown).unwrap();
        match event_rx.recv().unwrap() {
            TTSEvent::Shutdown => {}
            other => panic!("Expected shutdown event, got {:?}", other),
        }
        handle.join().unwrap();
    }
}
