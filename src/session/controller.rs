//! Session controller wiring the pipelines to the session state
//!
//! Spawns the completion and TTS workers, connects their channels into a
//! `SessionState`, and keeps the playback device in sync with the
//! playback state.

use crate::completion::{CompletionCommand, CompletionPipeline};
use crate::messages::{AudioHandle, Message};
use crate::session::config::SessionConfig;
use crate::session::state::SessionState;
use crate::speech::tts::{TTSCommand, TTSPipeline};
use crate::{AiConnectError, Result};
use std::thread::JoinHandle;
use tracing::info;

#[cfg(feature = "audio-io")]
use crate::audio::AudioOutput;
#[cfg(feature = "audio-io")]
use crate::session::state::PlaybackState;
#[cfg(feature = "audio-io")]
use tracing::warn;

/// Controller owning the session state and the pipeline workers
pub struct SessionController {
    state: SessionState,

    /// Worker threads for the two pipelines
    worker_handles: Vec<JoinHandle<()>>,

    /// Device-backed playback, if available
    #[cfg(feature = "audio-io")]
    output: Option<AudioOutput>,

    /// Handle currently loaded into the device sink
    #[cfg(feature = "audio-io")]
    device_source: Option<AudioHandle>,
}

impl SessionController {
    /// Create a controller, spawning both pipeline workers
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;

        let completion_pipeline = CompletionPipeline::new(config.completion.clone());
        let tts_pipeline = TTSPipeline::new(config.tts.clone());

        let mut state = SessionState::new();
        state.completion_command_tx = Some(completion_pipeline.command_sender());
        state.completion_event_rx = Some(completion_pipeline.event_receiver());
        state.tts_command_tx = Some(tts_pipeline.command_sender());
        state.tts_event_rx = Some(tts_pipeline.event_receiver());

        let mut worker_handles = Vec::new();
        worker_handles.push(completion_pipeline.start_worker()?);
        worker_handles.push(tts_pipeline.start_worker()?);
        info!("Session pipelines started");

        #[cfg(feature = "audio-io")]
        let output = if config.enable_audio_output {
            match AudioOutput::new() {
                Ok(output) => Some(output),
                Err(e) => {
                    warn!("Audio output unavailable, playback disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            state,
            worker_handles,
            #[cfg(feature = "audio-io")]
            output,
            #[cfg(feature = "audio-io")]
            device_source: None,
        })
    }

    /// Read access to the session state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The conversation so far, oldest first
    pub fn messages(&self) -> Vec<Message> {
        self.state.messages.get_all()
    }

    pub fn is_awaiting_completion(&self) -> bool {
        self.state.is_awaiting_completion()
    }

    pub fn is_awaiting_synthesis(&self) -> bool {
        self.state.is_awaiting_synthesis()
    }

    /// Take the last error, if any
    pub fn take_last_error(&mut self) -> Option<AiConnectError> {
        self.state.last_error.take()
    }

    /// Submit user text to the conversation
    pub fn submit(&mut self, text: &str) {
        self.state.submit(text);
    }

    /// Drain pipeline events and sync the playback device
    pub fn poll_events(&mut self) {
        self.state.poll_events();
        self.sync_output();
    }

    /// Play or pause the given handle on the shared playback unit
    pub fn toggle_audio(&mut self, handle: Option<&AudioHandle>) {
        self.state.toggle_audio(handle);
        self.sync_output();
    }

    /// Toggle audio for the message at the given transcript position.
    ///
    /// Returns false if there is no such message or it has no audio.
    pub fn toggle_audio_at(&mut self, index: usize) -> bool {
        let handle = self
            .state
            .messages
            .get_all()
            .get(index)
            .and_then(|m| m.audio.clone());

        let had_audio = handle.is_some();
        self.toggle_audio(handle.as_ref());
        had_audio
    }

    /// Bring the device sink in line with the playback state
    #[cfg(feature = "audio-io")]
    fn sync_output(&mut self) {
        let Some(output) = self.output.as_mut() else {
            return;
        };

        match (self.state.audio_player.state, &self.state.audio_player.current) {
            (PlaybackState::Playing, Some(handle)) => {
                if self.device_source.as_ref() == Some(handle) {
                    output.resume();
                } else if let Err(e) = output.play(handle) {
                    warn!("Playback failed: {}", e);
                    self.state.audio_player.stop();
                    self.device_source = None;
                } else {
                    output.set_volume(self.state.audio_player.volume);
                    self.device_source = Some(handle.clone());
                }
            }
            (PlaybackState::Paused, _) => output.pause(),
            (PlaybackState::Stopped, _) | (PlaybackState::Playing, None) => {
                output.stop();
                self.device_source = None;
            }
        }
    }

    #[cfg(not(feature = "audio-io"))]
    fn sync_output(&mut self) {}

    /// Shut down the pipeline workers and wait for them to finish
    pub fn shutdown(mut self) {
        if let Some(tx) = self.state.completion_command_tx.take() {
            let _ = tx.send(CompletionCommand::Shutdown);
        }
        if let Some(tx) = self.state.tts_command_tx.take() {
            let _ = tx.send(TTSCommand::Shutdown);
        }

        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }

        info!("Session controller shut down");
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(tx) = self.state.completion_command_tx.take() {
            let _ = tx.send(CompletionCommand::Shutdown);
        }
        if let Some(tx) = self.state.tts_command_tx.take() {
            let _ = tx.send(TTSCommand::Shutdown);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SessionConfig {
        SessionConfig::new("completion-key", "tts-key").without_audio_output()
    }

    #[test]
    fn test_controller_creation() {
        let controller = SessionController::new(test_config()).unwrap();
        assert!(controller.messages().is_empty());
        assert!(!controller.is_awaiting_completion());
        assert!(!controller.is_awaiting_synthesis());
        controller.shutdown();
    }

    #[test]
    fn test_controller_rejects_invalid_config() {
        let config = SessionConfig::default();
        assert!(SessionController::new(config).is_err());
    }

    #[test]
    fn test_toggle_audio_at_without_audio() {
        let mut controller = SessionController::new(test_config()).unwrap();
        assert!(!controller.toggle_audio_at(0));
        controller.shutdown();
    }
}
