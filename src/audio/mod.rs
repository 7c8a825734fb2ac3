//! Audio playback for synthesized speech
//!
//! The device-backed output is behind the `audio-io` feature; without it
//! playback is tracked purely in `session::state::AudioPlayerState`.

#[cfg(feature = "audio-io")]
pub mod output;

#[cfg(feature = "audio-io")]
pub use output::AudioOutput;
