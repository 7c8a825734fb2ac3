use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Opaque handle to a synthesized audio payload.
///
/// The raw bytes are whatever the TTS endpoint returned (typically MP3);
/// the playback unit decodes them, nothing else looks inside. Cloning is
/// cheap and clones refer to the same payload: equality is handle identity,
/// not byte comparison.
#[derive(Debug, Clone)]
pub struct AudioHandle {
    data: Arc<[u8]>,
}

impl AudioHandle {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { data: bytes.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl PartialEq for AudioHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl Eq for AudioHandle {}

impl AsRef<[u8]> for AudioHandle {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// A single conversation message.
///
/// The `id` is assigned at creation and is the identity used to attach
/// synthesized audio later; assistant messages start without audio and
/// gain at most one handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip)]
    pub audio: Option<AudioHandle>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            audio: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }
}
