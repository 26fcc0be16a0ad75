//! Message store
//!
//! Ordered arena of published messages keyed by sequence number. Cursors
//! refer to messages by sequence rather than by reference, so removing a
//! message can never leave a dangling cursor behind: a cursor resolves to
//! the oldest message whose sequence is at or after its position.

use crate::queue::message::{Sequence, StoredMessage};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug)]
pub struct MessageStore<T> {
    messages: BTreeMap<Sequence, StoredMessage<T>>,
    /// Sequence that the next appended message will receive
    next_sequence: Sequence,
}

impl<T> MessageStore<T> {
    pub fn new() -> Self {
        Self {
            messages: BTreeMap::new(),
            next_sequence: 1, // Start from 1, following Kafka convention
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn next_sequence(&self) -> Sequence {
        self.next_sequence
    }

    /// Append a payload at the tail, stamped with its reader count
    pub fn append(&mut self, payload: Arc<T>, reader_count: usize) -> Sequence {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.messages
            .insert(sequence, StoredMessage::new(sequence, payload, reader_count));
        sequence
    }

    /// Unlink a message; absent sequences are a no-op
    pub fn retire(&mut self, sequence: Sequence) -> Option<StoredMessage<T>> {
        self.messages.remove(&sequence)
    }

    pub fn front(&self) -> Option<&StoredMessage<T>> {
        self.messages.values().next()
    }

    pub fn get(&self, sequence: Sequence) -> Option<&StoredMessage<T>> {
        self.messages.get(&sequence)
    }

    pub fn get_mut(&mut self, sequence: Sequence) -> Option<&mut StoredMessage<T>> {
        self.messages.get_mut(&sequence)
    }

    pub fn contains(&self, sequence: Sequence) -> bool {
        self.messages.contains_key(&sequence)
    }

    /// Oldest stored message at or after `position`
    pub fn cursor_from(&self, position: Sequence) -> Option<&StoredMessage<T>> {
        self.messages.range(position..).next().map(|(_, msg)| msg)
    }

    /// Number of stored messages at or after `position`
    pub fn count_from(&self, position: Sequence) -> usize {
        self.messages.range(position..).count()
    }

    /// Sequences of every stored message at or after `position`, oldest first
    pub fn sequences_from(&self, position: Sequence) -> Vec<Sequence> {
        self.messages.range(position..).map(|(seq, _)| *seq).collect()
    }

    /// Locate a message by payload identity
    pub fn find_payload(&self, payload: &Arc<T>) -> Option<Sequence> {
        self.messages
            .values()
            .find(|msg| Arc::ptr_eq(&msg.payload, payload))
            .map(StoredMessage::sequence)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredMessage<T>> {
        self.messages.values()
    }

    /// Drop every stored message, returning how many were released
    pub fn clear(&mut self) -> usize {
        let released = self.messages.len();
        self.messages.clear();
        released
    }
}

impl<T> Default for MessageStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
