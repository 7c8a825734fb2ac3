use crate::messages::AudioHandle;
use crate::{AiConnectError, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::io::Cursor;
use tracing::{debug, info};

/// The shared playback unit backed by the default output device.
///
/// Holds at most one sink at a time; playing a new handle replaces the
/// prior source.
pub struct AudioOutput {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sink: Option<Sink>,
}

impl AudioOutput {
    /// Create a new audio output with the default output device
    pub fn new() -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| AiConnectError::AudioDeviceError(format!("No output device: {}", e)))?;

        info!("Audio output device ready");

        Ok(Self {
            _stream: stream,
            stream_handle,
            sink: None,
        })
    }

    /// Decode the handle's payload and start playing it, replacing any
    /// prior source
    pub fn play(&mut self, audio: &AudioHandle) -> Result<()> {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }

        let sink = Sink::try_new(&self.stream_handle).map_err(|e| {
            AiConnectError::AudioDeviceError(format!("Failed to create sink: {}", e))
        })?;

        let source = Decoder::new(Cursor::new(audio.clone())).map_err(|e| {
            AiConnectError::AudioDeviceError(format!("Failed to decode audio: {}", e))
        })?;

        sink.append(source);
        sink.play();
        self.sink = Some(sink);

        debug!("Playing {} byte audio clip", audio.len());
        Ok(())
    }

    /// Pause playback, keeping the source loaded
    pub fn pause(&self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    /// Resume paused playback
    pub fn resume(&self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    /// Stop playback and drop the source
    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    /// Set playback volume (0.0 to 1.0)
    pub fn set_volume(&self, volume: f32) {
        if let Some(sink) = &self.sink {
            sink.set_volume(volume);
        }
    }

    /// Check if playback is paused or no source is loaded
    pub fn is_paused(&self) -> bool {
        self.sink.as_ref().map(|s| s.is_paused()).unwrap_or(true)
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.stop();
    }
}
