//! Conversation session: state, configuration, and controller

pub mod config;
pub mod controller;
pub mod state;

pub use config::SessionConfig;
pub use controller::SessionController;
pub use state::{AudioPlayerState, PlaybackState, SessionState};
