//! Append-only message log.

use crate::types::Message;

/// Ordered store of discussion messages.
///
/// Strictly append-only: no reordering, no deletion, no deduplication. The
/// log always equals the exact append order, and locally synthesized system
/// messages are stored identically to server-delivered ones.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one message. O(1), order-preserving.
    pub fn append(&mut self, message: Message) {
        self.entries.push(message);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.entries.last()
    }
}
