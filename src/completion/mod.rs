//! Chat completion over a hosted HTTP endpoint

pub mod client;
pub mod config;
pub mod pipeline;

pub use client::{ChatTurn, CompletionClient};
pub use config::CompletionConfig;
pub use pipeline::{CompletionCommand, CompletionEvent, CompletionPipeline};
