//! Completion pipeline for managing chat-completion requests
//!
//! Provides a channel-based interface: commands go in, events come out.
//! The worker thread owns its own tokio runtime and the HTTP client.

use crate::completion::client::{ChatTurn, CompletionClient};
use crate::completion::config::CompletionConfig;
use crate::{AiConnectError, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tokio::runtime::Runtime;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Commands that can be sent to the completion pipeline
#[derive(Debug, Clone)]
pub enum CompletionCommand {
    /// Request an assistant reply for the given history
    Complete {
        /// Full conversation history, oldest first, ending with the new user turn
        history: Vec<ChatTurn>,
        /// Unique request ID for tracking
        request_id: Uuid,
    },

    /// Shutdown the pipeline
    Shutdown,
}

/// Events emitted by the completion pipeline
#[derive(Debug, Clone)]
pub enum CompletionEvent {
    /// A reply was received
    Complete {
        /// The assistant's reply text
        content: String,
        /// Request ID this reply belongs to
        request_id: Uuid,
    },

    /// An error occurred
    Error {
        /// What went wrong
        error: AiConnectError,
        /// Request ID if applicable
        request_id: Option<Uuid>,
    },

    /// Pipeline has shut down
    Shutdown,
}

/// Completion pipeline with channel-based communication
pub struct CompletionPipeline {
    /// Configuration
    config: CompletionConfig,

    /// Command sender
    command_tx: Sender<CompletionCommand>,

    /// Command receiver (for worker)
    command_rx: Receiver<CompletionCommand>,

    /// Event sender (for worker)
    event_tx: Sender<CompletionEvent>,

    /// Event receiver
    event_rx: Receiver<CompletionEvent>,
}

impl CompletionPipeline {
    /// Create a new completion pipeline
    pub fn new(config: CompletionConfig) -> Self {
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
    pub fn command_sender(&self) -> Sender<CompletionCommand> {
        self.command_tx.clone()
    }

    /// Get a receiver for events
    pub fn event_receiver(&self) -> Receiver<CompletionEvent> {
        self.event_rx.clone()
    }

    /// Start the pipeline worker thread
    pub fn start_worker(self) -> Result<JoinHandle<()>> {
        let config = self.config.clone();
        let command_rx = self.command_rx.clone();
        let event_tx = self.event_tx.clone();

        let handle = thread::spawn(move || {
            info!("Completion pipeline worker starting");

            let runtime = match Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    error!("Failed to create tokio runtime: {}", e);
                    let _ = event_tx.send(CompletionEvent::Error {
                        error: AiConnectError::CompletionError(format!(
                            "Runtime creation failed: {}",
                            e
                        )),
                        request_id: None,
                    });
                    let _ = event_tx.send(CompletionEvent::Shutdown);
                    return;
                }
            };

            let client = match CompletionClient::new(config) {
                Ok(client) => client,
                Err(e) => {
                    error!("Failed to initialize completion client: {}", e);
                    let _ = event_tx.send(CompletionEvent::Error {
                        error: e,
                        request_id: None,
                    });
                    let _ = event_tx.send(CompletionEvent::Shutdown);
                    return;
                }
            };

            info!("Completion pipeline worker ready");

            loop {
                match command_rx.recv() {
                    Ok(CompletionCommand::Complete {
                        history,
                        request_id,
                    }) => {
                        debug!("Processing completion request: {}", request_id);

                        match runtime.block_on(client.complete(&history)) {
                            Ok(content) => {
                                let _ = event_tx.send(CompletionEvent::Complete {
                                    content,
                                    request_id,
                                });
                            }
                            Err(e) => {
                                error!("Completion failed: {}", e);
                                let recoverable = e.is_recoverable();
                                let _ = event_tx.send(CompletionEvent::Error {
                                    error: e,
                                    request_id: Some(request_id),
                                });
                                if !recoverable {
                                    let _ = event_tx.send(CompletionEvent::Shutdown);
                                    break;
                                }
                            }
                        }
                    }

                    Ok(CompletionCommand::Shutdown) => {
                        info!("Completion pipeline worker shutting down");
                        let _ = event_tx.send(CompletionEvent::Shutdown);
                        break;
                    }

                    Err(e) => {
                        error!("Command channel error: {}", e);
                        break;
                    }
                }
            }

            info!("Completion pipeline worker stopped");
        });

        Ok(handle)
    }
}
