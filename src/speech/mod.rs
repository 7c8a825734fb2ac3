//! Speech synthesis via a hosted TTS endpoint

pub mod tts;

pub use tts::{TTSAudio, TTSClient, TTSCommand, TTSConfig, TTSEvent, TTSPipeline};
