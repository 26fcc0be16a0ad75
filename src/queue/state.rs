//! Lock-guarded queue state and the retirement rules
//!
//! `QueueState` aggregates the message store, the subscriber registry and
//! the capacity. It is only ever touched while the queue's mutex is held, so
//! nothing in here synchronises on its own. This is the single place where
//! `pending_readers` is decremented and where messages leave the store.

use crate::queue::message::{MessageHeader, PublishOutcome, Sequence, StoredMessage};
use crate::queue::registry::SubscriberRegistry;
use crate::queue::store::MessageStore;
use crate::queue::types::{LagStats, QueueStats, SubscriberInfo};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::SystemTime;

/// A payload handed to one subscriber
#[derive(Debug)]
pub(crate) struct Delivery<T> {
    pub payload: Arc<T>,
    pub sequence: Sequence,
    /// The message left the store because this was its last pending read
    pub retired: bool,
}

#[derive(Debug)]
pub(crate) struct QueueState<T, K> {
    pub capacity: usize,
    pub closed: bool,
    store: MessageStore<T>,
    registry: SubscriberRegistry<K>,
    published: u64,
    dropped: u64,
    retired: u64,
    evicted: u64,
}

impl<T, K> QueueState<T, K>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            closed: false,
            store: MessageStore::new(),
            registry: SubscriberRegistry::new(),
            published: 0,
            dropped: 0,
            retired: 0,
            evicted: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_full(&self) -> bool {
        self.store.len() >= self.capacity
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_subscribed(&self, id: &K) -> bool {
        self.registry.contains(id)
    }

    pub fn subscriber_ids(&self) -> Vec<K> {
        self.registry.ids()
    }

    pub fn front(&self) -> Option<Arc<T>> {
        self.store.front().map(|msg| Arc::clone(&msg.payload))
    }

    pub fn front_header(&self) -> Option<MessageHeader> {
        self.store.front().map(|msg| msg.header)
    }

    pub fn pending_readers(&self, sequence: Sequence) -> Option<usize> {
        self.store.get(sequence).map(|msg| msg.pending_readers)
    }

    /// Sequence of the message `id` would read next, if any
    pub fn cursor(&self, id: &K) -> Option<Sequence> {
        let sub = self.registry.find(id)?;
        self.store
            .cursor_from(sub.position)
            .map(StoredMessage::sequence)
    }

    pub fn available(&self, id: &K) -> usize {
        self.registry
            .find(id)
            .map(|sub| self.store.count_from(sub.position))
            .unwrap_or(0)
    }

    pub fn subscribe(&mut self, id: K) -> bool {
        let next_sequence = self.store.next_sequence();
        self.registry.register(id, next_sequence)
    }

    /// Remove `id` and release every message it still owed a read.
    ///
    /// Returns `None` if `id` was not subscribed, otherwise the number of
    /// messages retired because the departing subscriber was their last reader.
    pub fn unsubscribe(&mut self, id: &K) -> Option<usize> {
        let subscriber = self.registry.deregister(id)?;

        let mut retired = 0;
        for sequence in self.store.sequences_from(subscriber.position) {
            let last_reader = match self.store.get_mut(sequence) {
                Some(msg) => msg.mark_read(),
                None => continue,
            };
            if last_reader && self.unlink(sequence).is_some() {
                self.retired += 1;
                retired += 1;
            }
        }

        self.debug_check_invariants();
        Some(retired)
    }

    /// Append a payload stamped with the current subscriber count.
    ///
    /// The caller is responsible for waiting until the store has room.
    pub fn append(&mut self, payload: Arc<T>) -> PublishOutcome {
        let readers = self.registry.len();
        if readers == 0 {
            self.dropped += 1;
            return PublishOutcome::Dropped;
        }

        let sequence = self.store.append(payload, readers);
        self.published += 1;
        PublishOutcome::Queued { sequence, readers }
    }

    /// Hand the message under `id`'s cursor to `id` and advance the cursor.
    ///
    /// Returns `None` when `id` is unknown or has nothing to read.
    pub fn deliver_one(&mut self, id: &K) -> Option<Delivery<T>> {
        let sequence = self.cursor(id)?;

        let (payload, last_reader) = {
            let msg = self.store.get_mut(sequence)?;
            (Arc::clone(&msg.payload), msg.mark_read())
        };

        if let Some(sub) = self.registry.find_mut(id) {
            sub.record_read(sequence);
        }

        let retired = last_reader && self.unlink(sequence).is_some();
        if retired {
            self.retired += 1;
        }

        self.debug_check_invariants();
        Some(Delivery {
            payload,
            sequence,
            retired,
        })
    }

    /// Remove the oldest message regardless of how many readers it still has
    pub fn force_evict_oldest(&mut self) -> Option<StoredMessage<T>> {
        let sequence = self.store.front()?.sequence();
        let evicted = self.unlink(sequence)?;
        self.evicted += 1;
        Some(evicted)
    }

    /// Set a new capacity, evicting the oldest messages until they fit
    pub fn resize(&mut self, capacity: usize) -> usize {
        let mut evicted = 0;
        while self.store.len() > capacity {
            match self.force_evict_oldest() {
                Some(_) => evicted += 1,
                None => break,
            }
        }
        self.capacity = capacity;

        self.debug_check_invariants();
        evicted
    }

    /// Out-of-band removal of a specific payload; no-op if it is not stored
    pub fn remove_payload(&mut self, payload: &Arc<T>) -> bool {
        match self.store.find_payload(payload) {
            Some(sequence) => self.remove_sequence(sequence),
            None => false,
        }
    }

    pub fn remove_sequence(&mut self, sequence: Sequence) -> bool {
        if self.unlink(sequence).is_some() {
            self.evicted += 1;
            self.debug_check_invariants();
            true
        } else {
            false
        }
    }

    /// Release every message and subscriber and refuse further publishing
    pub fn close(&mut self) -> (usize, usize) {
        self.closed = true;
        let messages = self.store.clear();
        let subscribers = self.registry.clear();
        (messages, subscribers)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            capacity: self.capacity,
            size: self.store.len(),
            subscribers: self.registry.len(),
            next_sequence: self.store.next_sequence(),
            published: self.published,
            dropped: self.dropped,
            retired: self.retired,
            evicted: self.evicted,
        }
    }

    pub fn lag_stats(&self) -> LagStats {
        let lags: Vec<usize> = self
            .registry
            .iter()
            .map(|(_, sub)| self.store.count_from(sub.position))
            .collect();
        LagStats::from_lags(&lags)
    }

    /// Per-subscriber details, most lagging first
    pub fn subscriber_info(&self) -> Vec<SubscriberInfo<K>> {
        let now = SystemTime::now();
        let mut info: Vec<SubscriberInfo<K>> = self
            .registry
            .iter()
            .map(|(id, sub)| SubscriberInfo {
                id: id.clone(),
                lag: self.store.count_from(sub.position),
                delivered: sub.delivered,
                idle: now
                    .duration_since(sub.last_read.unwrap_or(sub.subscribed_at))
                    .unwrap_or_default(),
            })
            .collect();

        info.sort_by(|a, b| b.lag.cmp(&a.lag));
        info
    }

    /// Unlink a message from the store, first moving every cursor that
    /// currently resolves to it onto the following message.
    fn unlink(&mut self, sequence: Sequence) -> Option<StoredMessage<T>> {
        if !self.store.contains(sequence) {
            return None;
        }

        let store = &self.store;
        for (_, sub) in self.registry.iter_mut() {
            let points_here = sub.position <= sequence
                && store
                    .cursor_from(sub.position)
                    .is_some_and(|msg| msg.sequence() == sequence);
            if points_here {
                sub.advance_past(sequence);
            }
        }

        self.store.retire(sequence)
    }

    #[cfg(debug_assertions)]
    fn debug_check_invariants(&self) {
        debug_assert!(
            self.store.iter().all(|msg| msg.pending_readers > 0),
            "fully read message left in the store"
        );
        for (id, sub) in self.registry.iter() {
            debug_assert!(
                sub.position <= self.store.next_sequence(),
                "cursor of {:?} points past the newest message",
                id
            );
        }
    }

    #[cfg(not(debug_assertions))]
    fn debug_check_invariants(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(capacity: usize) -> QueueState<&'static str, &'static str> {
        QueueState::new(capacity)
    }

    #[test]
    fn test_append_without_subscribers_drops() {
        let mut state = state(2);

        assert_eq!(state.append(Arc::new("m1")), PublishOutcome::Dropped);
        assert_eq!(state.len(), 0);
        assert_eq!(state.stats().dropped, 1);
    }

    #[test]
    fn test_last_reader_retires_message() {
        let mut state = state(4);
        state.subscribe("a");
        state.subscribe("b");
        state.append(Arc::new("m1"));

        let first = state.deliver_one(&"a").unwrap();
        assert!(!first.retired);
        assert_eq!(state.pending_readers(first.sequence), Some(1));

        let second = state.deliver_one(&"b").unwrap();
        assert!(second.retired);
        assert_eq!(state.len(), 0);
        assert_eq!(state.stats().retired, 1);
    }

    #[test]
    fn test_unsubscribe_releases_owed_messages() {
        let mut state = state(4);
        state.subscribe("a");
        state.subscribe("b");
        state.append(Arc::new("m1"));
        state.append(Arc::new("m2"));
        state.deliver_one(&"a");
        state.deliver_one(&"a");

        assert_eq!(state.unsubscribe(&"b"), Some(2));
        assert_eq!(state.len(), 0);
        assert_eq!(state.unsubscribe(&"b"), None);
    }

    #[test]
    fn test_eviction_moves_cursors_forward() {
        let mut state = state(3);
        state.subscribe("a");
        state.append(Arc::new("m1"));
        let m2 = state.append(Arc::new("m2")).sequence().unwrap();

        assert!(state.force_evict_oldest().is_some());
        assert_eq!(state.cursor(&"a"), Some(m2));
        assert_eq!(state.available(&"a"), 1);
        assert_eq!(state.stats().evicted, 1);
    }

    #[test]
    fn test_remove_sequence_in_the_middle() {
        let mut state = state(3);
        state.subscribe("a");
        let m1 = state.append(Arc::new("m1")).sequence().unwrap();
        let m2 = state.append(Arc::new("m2")).sequence().unwrap();
        let m3 = state.append(Arc::new("m3")).sequence().unwrap();

        assert!(state.remove_sequence(m2));
        assert!(!state.remove_sequence(m2));
        assert_eq!(state.cursor(&"a"), Some(m1));

        assert_eq!(*state.deliver_one(&"a").unwrap().payload, "m1");
        let next = state.deliver_one(&"a").unwrap();
        assert_eq!(next.sequence, m3);
    }

    #[test]
    fn test_close_clears_everything() {
        let mut state = state(3);
        state.subscribe("a");
        state.append(Arc::new("m1"));

        assert_eq!(state.close(), (1, 1));
        assert!(state.closed);
        assert_eq!(state.subscriber_count(), 0);
    }
}
