use super::types::{AudioHandle, Message};
use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

/// Append-only, thread-safe store for the conversation.
///
/// Messages are never removed or reordered during a session; insertion
/// order is the display order and the history order sent to the
/// completion endpoint.
#[derive(Debug, Clone)]
pub struct MessageStorage {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl MessageStorage {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn add(&self, message: Message) {
        self.messages.write().push(message);
    }

    pub fn get_all(&self) -> Vec<Message> {
        self.messages.read().clone()
    }

    pub fn get(&self, id: Uuid) -> Option<Message> {
        self.messages.read().iter().find(|m| m.id == id).cloned()
    }

    /// Attach synthesized audio to the message with the given id.
    ///
    /// Matching is by id, never by index, so the update lands on the right
    /// message even if more have been appended since synthesis started.
    /// Returns false if no message has that id.
    pub fn attach_audio(&self, id: Uuid, audio: AudioHandle) -> bool {
        let mut messages = self.messages.write();
        match messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.audio = Some(audio);
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        self.messages.write().clear();
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}

impl Default for MessageStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::types::Role;

    #[test]
    fn test_add_preserves_order() {
        let storage = MessageStorage::new();
        storage.add(Message::user("first"));
        storage.add(Message::assistant("second"));
        storage.add(Message::user("third"));

        let all = storage.get_all();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].content, "first");
        assert_eq!(all[1].content, "second");
        assert_eq!(all[2].content, "third");
        assert_eq!(all[1].role, Role::Assistant);
    }

    #[test]
    fn test_attach_audio_by_id() {
        let storage = MessageStorage::new();
        let msg = Message::assistant("reply");
        let id = msg.id;
        storage.add(msg);
        // Later messages must not receive the attachment
        storage.add(Message::assistant("another reply"));

        let handle = AudioHandle::new(vec![0xde, 0xad]);
        assert!(storage.attach_audio(id, handle.clone()));

        let all = storage.get_all();
        assert_eq!(all[0].audio.as_ref(), Some(&handle));
        assert!(all[1].audio.is_none());
    }

    #[test]
    fn test_attach_audio_unknown_id() {
        let storage = MessageStorage::new();
        storage.add(Message::assistant("reply"));

        let handle = AudioHandle::new(vec![1]);
        assert!(!storage.attach_audio(Uuid::new_v4(), handle));
        assert!(storage.get_all()[0].audio.is_none());
    }

    #[test]
    fn test_get_by_id() {
        let storage = MessageStorage::new();
        let msg = Message::user("hi");
        let id = msg.id;
        storage.add(msg);

        assert_eq!(storage.get(id).unwrap().content, "hi");
        assert!(storage.get(Uuid::new_v4()).is_none());
    }
}
