//! Subscriber registry
//!
//! Tracks which consumers are currently subscribed and where each one is in
//! the message stream. A subscriber's cursor is stored as a position: the
//! lowest sequence it may still read. New subscribers start at the next
//! sequence to be published and therefore never see older messages.

use crate::queue::message::Sequence;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::SystemTime;

/// Per-subscriber cursor and bookkeeping
#[derive(Debug, Clone)]
pub struct Subscriber {
    /// Lowest sequence this subscriber has not consumed yet
    pub position: Sequence,
    pub subscribed_at: SystemTime,
    pub last_read: Option<SystemTime>,
    /// Messages handed to this subscriber so far
    pub delivered: u64,
}

impl Subscriber {
    fn new(position: Sequence) -> Self {
        Self {
            position,
            subscribed_at: SystemTime::now(),
            last_read: None,
            delivered: 0,
        }
    }

    /// Move the cursor past `sequence` after it was read
    pub fn advance_past(&mut self, sequence: Sequence) {
        self.position = sequence + 1;
    }

    pub fn record_read(&mut self, sequence: Sequence) {
        self.advance_past(sequence);
        self.last_read = Some(SystemTime::now());
        self.delivered += 1;
    }
}

#[derive(Debug)]
pub struct SubscriberRegistry<K> {
    subscribers: HashMap<K, Subscriber>,
}

impl<K> SubscriberRegistry<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
        }
    }

    /// Register `id` with an empty cursor; returns false if already present
    pub fn register(&mut self, id: K, next_sequence: Sequence) -> bool {
        if self.subscribers.contains_key(&id) {
            return false;
        }
        self.subscribers.insert(id, Subscriber::new(next_sequence));
        true
    }

    pub fn deregister(&mut self, id: &K) -> Option<Subscriber> {
        self.subscribers.remove(id)
    }

    pub fn find(&self, id: &K) -> Option<&Subscriber> {
        self.subscribers.get(id)
    }

    pub fn find_mut(&mut self, id: &K) -> Option<&mut Subscriber> {
        self.subscribers.get_mut(id)
    }

    pub fn contains(&self, id: &K) -> bool {
        self.subscribers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn ids(&self) -> Vec<K> {
        self.subscribers.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &Subscriber)> {
        self.subscribers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut Subscriber)> {
        self.subscribers.iter_mut()
    }

    pub fn clear(&mut self) -> usize {
        let released = self.subscribers.len();
        self.subscribers.clear();
        released
    }
}

impl<K> Default for SubscriberRegistry<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
