//! Message Types for the Broadcast Queue
//!
//! A published payload is wrapped in a [`StoredMessage`] that carries the
//! queue-assigned header and the number of subscribers that still have to
//! read it. Payloads are reference counted so every consumer gets its own
//! cheap handle to the same data.

use std::sync::Arc;
use std::time::SystemTime;

/// Monotonic message sequence number, assigned by the queue starting at 1
pub type Sequence = u64;

/// Header information for every stored message
///
/// Populated by the queue at publish time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Monotonic sequence number assigned by the queue
    pub sequence: Sequence,
    /// Timestamp when the message was published
    pub timestamp: SystemTime,
}

/// A message held in the shared store until every pending reader has seen it
#[derive(Debug)]
pub struct StoredMessage<T> {
    pub header: MessageHeader,
    pub payload: Arc<T>,
    /// Subscribers that were present at publish time and have not read it yet
    pub pending_readers: usize,
}

impl<T> StoredMessage<T> {
    pub fn new(sequence: Sequence, payload: Arc<T>, pending_readers: usize) -> Self {
        Self {
            header: MessageHeader {
                sequence,
                timestamp: SystemTime::now(),
            },
            payload,
            pending_readers,
        }
    }

    pub fn sequence(&self) -> Sequence {
        self.header.sequence
    }

    /// Record one read; returns true when no reader is left
    pub fn mark_read(&mut self) -> bool {
        debug_assert!(self.pending_readers > 0, "message read after retirement");
        self.pending_readers = self.pending_readers.saturating_sub(1);
        self.pending_readers == 0
    }
}

/// What happened to a payload handed to `publish`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Appended to the store and stamped with the subscriber count
    Queued { sequence: Sequence, readers: usize },
    /// Nobody was subscribed, the payload was discarded
    Dropped,
}

impl PublishOutcome {
    pub fn sequence(&self) -> Option<Sequence> {
        match self {
            PublishOutcome::Queued { sequence, .. } => Some(*sequence),
            PublishOutcome::Dropped => None,
        }
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, PublishOutcome::Queued { .. })
    }
}
