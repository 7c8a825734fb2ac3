//! Session state management
//!
//! The central state for one conversation: the append-only message list,
//! the two loading flags, and the shared playback unit. State is mutated
//! only from `submit`, `toggle_audio`, and the `poll_events` drain the
//! shell calls each tick, so no locking is needed beyond the message
//! storage itself.

use crate::completion::{ChatTurn, CompletionCommand, CompletionEvent};
use crate::messages::{AudioHandle, Message, MessageStorage};
use crate::speech::tts::{TTSCommand, TTSEvent};
use crate::AiConnectError;
use crossbeam_channel::{Receiver, Sender as ChannelSender};
use tracing::{debug, warn};
use uuid::Uuid;

/// Audio playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No audio loaded or playback stopped
    Stopped,
    /// Audio is playing
    Playing,
    /// Audio is paused
    Paused,
}

/// State of the shared playback unit
///
/// Pure bookkeeping: which handle is loaded and whether it is playing.
/// The device-backed sink in `audio::output` is synced to this.
#[derive(Debug, Clone)]
pub struct AudioPlayerState {
    /// The handle currently loaded as the playback source
    pub current: Option<AudioHandle>,
    /// Playback state
    pub state: PlaybackState,
    /// Volume (0.0 to 1.0)
    pub volume: f32,
}

impl Default for AudioPlayerState {
    fn default() -> Self {
        Self {
            current: None,
            state: PlaybackState::Stopped,
            volume: 0.8,
        }
    }
}

impl AudioPlayerState {
    /// Toggle playback for the given handle.
    ///
    /// No handle is a no-op. While not playing, the handle is loaded and
    /// playback starts; while playing, playback pauses and the loaded
    /// handle is left unchanged. Only one handle is the active source at
    /// a time.
    pub fn toggle(&mut self, handle: Option<&AudioHandle>) {
        let Some(handle) = handle else {
            return;
        };

        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        } else {
            self.current = Some(handle.clone());
            self.state = PlaybackState::Playing;
        }
    }

    /// Load a handle and start playback, replacing any prior source
    pub fn play(&mut self, handle: AudioHandle) {
        self.current = Some(handle);
        self.state = PlaybackState::Playing;
    }

    /// Pause playback without unloading the source
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Stop playback
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }
}

/// Central session state
pub struct SessionState {
    /// Message storage (thread-safe, append-only)
    pub messages: MessageStorage,

    /// Current text input buffer
    pub input_text: String,

    /// Audio player state
    pub audio_player: AudioPlayerState,

    /// Last error, surfaced to the shell but never to the transcript
    pub last_error: Option<AiConnectError>,

    /// Channel to send completion commands
    pub completion_command_tx: Option<ChannelSender<CompletionCommand>>,

    /// Channel to receive completion events
    pub completion_event_rx: Option<Receiver<CompletionEvent>>,

    /// Channel to send TTS commands
    pub tts_command_tx: Option<ChannelSender<TTSCommand>>,

    /// Channel to receive TTS events
    pub tts_event_rx: Option<Receiver<TTSEvent>>,

    /// Request id of the most recent submit, while its outcome is unrecorded
    current_request: Option<Uuid>,

    /// Number of synthesis requests in flight
    pending_synthesis: usize,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Create a new, unwired session state
    pub fn new() -> Self {
        Self {
            messages: MessageStorage::new(),
            input_text: String::new(),
            audio_player: AudioPlayerState::default(),
            last_error: None,
            completion_command_tx: None,
            completion_event_rx: None,
            tts_command_tx: None,
            tts_event_rx: None,
            current_request: None,
            pending_synthesis: 0,
        }
    }

    /// True while the most recent submit's completion outcome is unrecorded
    pub fn is_awaiting_completion(&self) -> bool {
        self.current_request.is_some()
    }

    /// True while any synthesis request is in flight
    pub fn is_awaiting_synthesis(&self) -> bool {
        self.pending_synthesis > 0
    }

    /// Submit user text to the conversation.
    ///
    /// Appends a user message, clears the input buffer, and requests a
    /// completion for the full history. Empty or whitespace-only text is
    /// ignored.
    pub fn submit(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        self.messages.add(Message::user(text));
        self.input_text.clear();

        if let Some(tx) = &self.completion_command_tx {
            let request_id = Uuid::new_v4();
            let history: Vec<ChatTurn> = self
                .messages
                .get_all()
                .iter()
                .map(ChatTurn::from)
                .collect();

            let _ = tx.send(CompletionCommand::Complete {
                history,
                request_id,
            });

            self.current_request = Some(request_id);
        }
    }

    /// Submit whatever is in the input buffer
    pub fn send_message(&mut self) {
        let text = std::mem::take(&mut self.input_text);
        self.submit(&text);
    }

    /// Play or pause the given audio handle on the shared playback unit.
    ///
    /// Messages without synthesized audio pass `None`, which is a no-op.
    pub fn toggle_audio(&mut self, handle: Option<&AudioHandle>) {
        self.audio_player.toggle(handle);
    }

    /// Request speech synthesis for an assistant message.
    ///
    /// Issued exactly once per assistant message, right after it is
    /// appended from a completion result.
    fn synthesize(&mut self, message_id: Uuid, text: String) {
        if let Some(tx) = &self.tts_command_tx {
            let _ = tx.send(TTSCommand::Synthesize { text, message_id });
            self.pending_synthesis += 1;
        }
    }

    /// Process incoming events from the pipeline channels
    pub fn poll_events(&mut self) {
        let completion_events: Vec<CompletionEvent> = match &self.completion_event_rx {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        };

        for event in completion_events {
            match event {
                CompletionEvent::Complete {
                    content,
                    request_id,
                } => {
                    if self.current_request == Some(request_id) {
                        self.current_request = None;
                    }

                    let message = Message::assistant(content);
                    let message_id = message.id;
                    let text = message.content.clone();
                    self.messages.add(message);

                    self.synthesize(message_id, text);
                }
                CompletionEvent::Error { error, request_id } => {
                    warn!("Completion failed: {}", error);
                    self.last_error = Some(error);

                    if request_id.is_none() || self.current_request == request_id {
                        self.current_request = None;
                    }
                }
                CompletionEvent::Shutdown => {
                    debug!("Completion pipeline shutdown");
                    self.current_request = None;
                }
            }
        }

        let tts_events: Vec<TTSEvent> = match &self.tts_event_rx {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        };

        for event in tts_events {
            match event {
                TTSEvent::Audio(audio) => {
                    self.pending_synthesis = self.pending_synthesis.saturating_sub(1);

                    let handle = AudioHandle::new(audio.bytes);
                    if self.messages.attach_audio(audio.message_id, handle.clone()) {
                        // Synthesized audio starts playing automatically
                        self.audio_player.play(handle);
                    } else {
                        warn!("TTS result for unknown message {}", audio.message_id);
                    }
                }
                TTSEvent::Error { error, message_id } => {
                    warn!("TTS failed for message {:?}: {}", message_id, error);
                    self.last_error = Some(error);
                    self.pending_synthesis = self.pending_synthesis.saturating_sub(1);
                }
                TTSEvent::Shutdown => {
                    debug!("TTS pipeline shutdown");
                    self.pending_synthesis = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Role;
    use crate::speech::tts::TTSAudio;
    use crossbeam_channel::{bounded, Receiver, Sender};

    struct Wired {
        state: SessionState,
        completion_command_rx: Receiver<CompletionCommand>,
        completion_event_tx: Sender<CompletionEvent>,
        tts_command_rx: Receiver<TTSCommand>,
        tts_event_tx: Sender<TTSEvent>,
    }

    fn wired_state() -> Wired {
        let (completion_command_tx, completion_command_rx) = bounded(16);
        let (completion_event_tx, completion_event_rx) = bounded(16);
        let (tts_command_tx, tts_command_rx) = bounded(16);
        let (tts_event_tx, tts_event_rx) = bounded(16);

        let mut state = SessionState::new();
        state.completion_command_tx = Some(completion_command_tx);
        state.completion_event_rx = Some(completion_event_rx);
        state.tts_command_tx = Some(tts_command_tx);
        state.tts_event_rx = Some(tts_event_rx);

        Wired {
            state,
            completion_command_rx,
            completion_event_tx,
            tts_command_rx,
            tts_event_tx,
        }
    }

    /// Answer the pending completion request with the given reply
    fn answer_completion(wired: &mut Wired, content: &str) {
        let request_id = match wired.completion_command_rx.try_recv().unwrap() {
            CompletionCommand::Complete { request_id, .. } => request_id,
            other => panic!("Expected Complete command, got {:?}", other),
        };
        wired
            .completion_event_tx
            .send(CompletionEvent::Complete {
                content: content.to_string(),
                request_id,
            })
            .unwrap();
        wired.state.poll_events();
    }

    #[test]
    fn test_submit_appends_and_requests_completion() {
        let mut wired = wired_state();
        wired.state.submit("Hello");

        let all = wired.state.messages.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].role, Role::User);
        assert_eq!(all[0].content, "Hello");
        assert!(wired.state.is_awaiting_completion());

        match wired.completion_command_rx.try_recv().unwrap() {
            CompletionCommand::Complete { history, .. } => {
                assert_eq!(history.len(), 1);
                assert_eq!(history[0].content, "Hello");
            }
            other => panic!("Expected Complete command, got {:?}", other),
        }
    }

    #[test]
    fn test_submit_empty_is_noop() {
        let mut wired = wired_state();
        wired.state.submit("   ");
        assert!(wired.state.messages.is_empty());
        assert!(!wired.state.is_awaiting_completion());
        assert!(wired.completion_command_rx.try_recv().is_err());
    }

    #[test]
    fn test_submit_clears_input_buffer() {
        let mut wired = wired_state();
        wired.state.input_text = "Hello".to_string();
        wired.state.send_message();
        assert!(wired.state.input_text.is_empty());
        assert_eq!(wired.state.messages.len(), 1);
    }

    #[test]
    fn test_completion_success_appends_and_synthesizes_once() {
        let mut wired = wired_state();
        wired.state.submit("Hello");
        answer_completion(&mut wired, "Hi there");

        let all = wired.state.messages.get_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].role, Role::Assistant);
        assert_eq!(all[1].content, "Hi there");
        assert!(!wired.state.is_awaiting_completion());
        assert!(wired.state.is_awaiting_synthesis());

        match wired.tts_command_rx.try_recv().unwrap() {
            TTSCommand::Synthesize { text, message_id } => {
                assert_eq!(text, "Hi there");
                assert_eq!(message_id, all[1].id);
            }
            other => panic!("Expected Synthesize command, got {:?}", other),
        }
        // Exactly one synthesis per assistant message
        assert!(wired.tts_command_rx.try_recv().is_err());
    }

    #[test]
    fn test_completion_failure_leaves_session_unchanged() {
        let mut wired = wired_state();
        wired.state.submit("Hello");
        let request_id = match wired.completion_command_rx.try_recv().unwrap() {
            CompletionCommand::Complete { request_id, .. } => request_id,
            other => panic!("Expected Complete command, got {:?}", other),
        };

        wired
            .completion_event_tx
            .send(CompletionEvent::Error {
                error: AiConnectError::CompletionError("boom".into()),
                request_id: Some(request_id),
            })
            .unwrap();
        wired.state.poll_events();

        // User message stays, no assistant message, no synthesis attempted
        assert_eq!(wired.state.messages.len(), 1);
        assert!(!wired.state.is_awaiting_completion());
        assert!(!wired.state.is_awaiting_synthesis());
        assert!(wired.tts_command_rx.try_recv().is_err());
        match wired.state.last_error {
            Some(AiConnectError::CompletionError(ref msg)) => assert_eq!(msg, "boom"),
            ref other => panic!("Expected completion error, got {:?}", other),
        }
    }

    #[test]
    fn test_synthesis_success_attaches_by_id_and_autoplays() {
        let mut wired = wired_state();
        wired.state.submit("Hello");
        answer_completion(&mut wired, "Hi there");

        let assistant_id = wired.state.messages.get_all()[1].id;
        // Another turn appended while synthesis is still in flight
        wired.state.submit("Something else");

        wired
            .tts_event_tx
            .send(TTSEvent::Audio(TTSAudio {
                bytes: vec![1, 2, 3],
                message_id: assistant_id,
            }))
            .unwrap();
        wired.state.poll_events();

        let assistant = wired.state.messages.get(assistant_id).unwrap();
        let handle = assistant.audio.expect("audio attached");
        assert_eq!(handle.as_bytes(), &[1, 2, 3]);
        assert!(!wired.state.is_awaiting_synthesis());

        // Autoplay loaded exactly that handle
        assert_eq!(wired.state.audio_player.state, PlaybackState::Playing);
        assert_eq!(wired.state.audio_player.current, Some(handle));
    }

    #[test]
    fn test_synthesis_failure_leaves_message_without_audio() {
        let mut wired = wired_state();
        wired.state.submit("Hi");
        answer_completion(&mut wired, "Hello!");

        let assistant_id = wired.state.messages.get_all()[1].id;
        wired
            .tts_event_tx
            .send(TTSEvent::Error {
                error: AiConnectError::TTSError("tts down".into()),
                message_id: Some(assistant_id),
            })
            .unwrap();
        wired.state.poll_events();

        assert!(!wired.state.is_awaiting_synthesis());
        assert!(wired.state.messages.get(assistant_id).unwrap().audio.is_none());
        assert_eq!(wired.state.audio_player.state, PlaybackState::Stopped);
    }

    #[test]
    fn test_full_turn_scenario() {
        let mut wired = wired_state();
        wired.state.submit("Hello");
        answer_completion(&mut wired, "Hi there");

        let assistant_id = match wired.tts_command_rx.try_recv().unwrap() {
            TTSCommand::Synthesize { message_id, .. } => message_id,
            other => panic!("Expected Synthesize command, got {:?}", other),
        };
        wired
            .tts_event_tx
            .send(TTSEvent::Audio(TTSAudio {
                bytes: b"mp3 bytes".to_vec(),
                message_id: assistant_id,
            }))
            .unwrap();
        wired.state.poll_events();

        let all = wired.state.messages.get_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].role, Role::User);
        assert_eq!(all[0].content, "Hello");
        assert_eq!(all[1].role, Role::Assistant);
        assert_eq!(all[1].content, "Hi there");
        assert!(all[1].has_audio());
        assert!(!wired.state.is_awaiting_completion());
        assert!(!wired.state.is_awaiting_synthesis());
    }

    #[test]
    fn test_overlapping_submissions_keyed_by_request_id() {
        let mut wired = wired_state();
        wired.state.submit("first");
        let first_request = match wired.completion_command_rx.try_recv().unwrap() {
            CompletionCommand::Complete { request_id, .. } => request_id,
            other => panic!("Expected Complete command, got {:?}", other),
        };

        // Second submit while the first completion is still outstanding
        wired.state.submit("second");
        assert!(wired.state.is_awaiting_completion());

        // The stale reply still lands, but only the newest request
        // clears the loading flag
        wired
            .completion_event_tx
            .send(CompletionEvent::Complete {
                content: "reply to first".to_string(),
                request_id: first_request,
            })
            .unwrap();
        wired.state.poll_events();

        assert_eq!(wired.state.messages.len(), 3);
        assert!(wired.state.is_awaiting_completion());

        answer_completion(&mut wired, "reply to second");
        assert_eq!(wired.state.messages.len(), 4);
        assert!(!wired.state.is_awaiting_completion());
    }

    #[test]
    fn test_toggle_audio_none_is_noop() {
        let mut state = SessionState::new();
        state.toggle_audio(None);
        assert_eq!(state.audio_player.state, PlaybackState::Stopped);
        assert!(state.audio_player.current.is_none());
    }

    #[test]
    fn test_toggle_audio_play_pause_cycle() {
        let mut state = SessionState::new();
        let handle = AudioHandle::new(vec![9, 9, 9]);

        state.toggle_audio(Some(&handle));
        assert_eq!(state.audio_player.state, PlaybackState::Playing);
        assert_eq!(state.audio_player.current, Some(handle.clone()));

        // Toggling while playing pauses without changing the loaded handle
        state.toggle_audio(Some(&handle));
        assert_eq!(state.audio_player.state, PlaybackState::Paused);
        assert_eq!(state.audio_player.current, Some(handle.clone()));

        // Toggling a different handle while paused replaces the source
        let other = AudioHandle::new(vec![7]);
        state.toggle_audio(Some(&other));
        assert_eq!(state.audio_player.state, PlaybackState::Playing);
        assert_eq!(state.audio_player.current, Some(other));
    }

    #[test]
    fn test_unwired_state_records_nothing_in_flight() {
        let mut state = SessionState::new();
        state.submit("Hello");

        // Message appended, but with no pipeline wired there is nothing
        // to await
        assert_eq!(state.messages.len(), 1);
        assert!(!state.is_awaiting_completion());
        state.poll_events();
    }
}
