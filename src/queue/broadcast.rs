//! BroadcastQueue - the synchronised public surface of the queue
//!
//! One mutex guards the whole [`QueueState`]; two condition variables hang
//! off it. `data_available` is broadcast whenever a consumer might find
//! something under its cursor (a publish, a (de)registration) and
//! `space_available` whenever the store shrinks or the capacity grows.
//! Every waiter re-checks its own predicate after waking.

use crate::core::sync::{handle_mutex_poison, wait_timeout_while, wait_while};
use crate::queue::config::QueueConfig;
use crate::queue::consumer::QueueConsumer;
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::message::{MessageHeader, PublishOutcome, Sequence};
use crate::queue::publisher::QueuePublisher;
use crate::queue::state::QueueState;
use crate::queue::types::{LagStats, QueueStats, SubscriberInfo};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::ThreadId;
use std::time::Duration;

fn poisoned(message: String) -> QueueError {
    QueueError::Poisoned { message }
}

/// Bounded multi-producer/multi-consumer broadcast queue
///
/// Every payload published while at least one subscriber is registered is
/// delivered once to each subscriber registered at that moment, in publish
/// order. A message stays in the store until all of those subscribers have
/// read it or unsubscribed. Publishing blocks while the store is at capacity;
/// consuming blocks while the caller's cursor is empty.
///
/// Subscribers are identified by any hashable key `K`. The default is the
/// calling thread's [`ThreadId`].
///
/// # Example
///
/// ```rust
/// use broadcastq::queue::BroadcastQueue;
///
/// let queue: BroadcastQueue<String, &str> = BroadcastQueue::new(8).unwrap();
/// queue.subscribe("reader").unwrap();
///
/// queue.publish("hello".to_string()).unwrap();
/// let message = queue.consume(&"reader").unwrap().unwrap();
/// assert_eq!(message.as_str(), "hello");
/// ```
pub struct BroadcastQueue<T, K = ThreadId> {
    state: Mutex<QueueState<T, K>>,
    data_available: Condvar,
    space_available: Condvar,
}

impl<T, K> BroadcastQueue<T, K>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Create a queue holding at most `capacity` messages
    pub fn new(capacity: usize) -> QueueResult<Self> {
        if capacity == 0 {
            return Err(QueueError::InvalidCapacity { capacity });
        }

        log::debug!("Creating broadcast queue with capacity {}", capacity);
        Ok(Self {
            state: Mutex::new(QueueState::new(capacity)),
            data_available: Condvar::new(),
            space_available: Condvar::new(),
        })
    }

    pub fn from_config(config: &QueueConfig) -> QueueResult<Self> {
        Self::new(config.capacity)
    }

    fn lock(&self) -> QueueResult<MutexGuard<'_, QueueState<T, K>>> {
        handle_mutex_poison(self.state.lock(), poisoned)
    }

    /// Register `id`. Returns false if it was already subscribed.
    ///
    /// A new subscriber only sees messages published after this call.
    pub fn subscribe(&self, id: K) -> QueueResult<bool> {
        let mut state = self.lock()?;
        if state.closed {
            return Err(QueueError::Closed);
        }

        let registered = state.subscribe(id.clone());
        let subscribers = state.subscriber_count();
        drop(state);

        if registered {
            log::debug!("Subscribed {:?} ({} active)", id, subscribers);
            self.data_available.notify_all();
        }
        Ok(registered)
    }

    /// Deregister `id`, retiring every message it was the last reader of.
    /// Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: &K) -> QueueResult<bool> {
        let mut state = self.lock()?;
        let retired = match state.unsubscribe(id) {
            Some(retired) => retired,
            None => return Ok(false),
        };
        let subscribers = state.subscriber_count();
        drop(state);

        log::debug!(
            "Unsubscribed {:?} ({} active, {} messages retired)",
            id,
            subscribers,
            retired
        );

        // A consumer blocked on this id must notice it is gone
        self.data_available.notify_all();
        if retired > 0 {
            self.space_available.notify_all();
        }
        Ok(true)
    }

    /// Publish a payload to every current subscriber, blocking while full.
    ///
    /// With no subscribers the payload is dropped without blocking. If every
    /// subscriber leaves while this call waits for space, the payload is
    /// dropped as well.
    pub fn publish(&self, payload: impl Into<Arc<T>>) -> QueueResult<PublishOutcome> {
        let payload = payload.into();
        let state = self.lock()?;
        let state = wait_while(
            &self.space_available,
            state,
            |s| Self::must_wait_for_space(s),
            poisoned,
        )?;
        self.append_locked(state, payload)
    }

    /// Like [`publish`](Self::publish) but waits at most `timeout` for space
    pub fn publish_timeout(
        &self,
        payload: impl Into<Arc<T>>,
        timeout: Duration,
    ) -> QueueResult<PublishOutcome> {
        let payload = payload.into();
        let state = self.lock()?;
        let (state, result) = wait_timeout_while(
            &self.space_available,
            state,
            timeout,
            |s| Self::must_wait_for_space(s),
            poisoned,
        )?;
        if result.timed_out() {
            return Err(QueueError::Timeout { waited: timeout });
        }
        self.append_locked(state, payload)
    }

    /// Publish without blocking; fails with `QueueFull` when at capacity
    pub fn try_publish(&self, payload: impl Into<Arc<T>>) -> QueueResult<PublishOutcome> {
        let payload = payload.into();
        let state = self.lock()?;
        if Self::must_wait_for_space(&state) {
            return Err(QueueError::QueueFull {
                capacity: state.capacity,
            });
        }
        self.append_locked(state, payload)
    }

    fn must_wait_for_space(state: &QueueState<T, K>) -> bool {
        !state.closed && state.subscriber_count() > 0 && state.is_full()
    }

    fn append_locked(
        &self,
        mut state: MutexGuard<'_, QueueState<T, K>>,
        payload: Arc<T>,
    ) -> QueueResult<PublishOutcome> {
        if state.closed {
            return Err(QueueError::Closed);
        }

        let outcome = state.append(payload);
        let size = state.len();
        drop(state);

        match outcome {
            PublishOutcome::Queued { sequence, readers } => {
                log::trace!(
                    "Published message {} for {} readers (size {})",
                    sequence,
                    readers,
                    size
                );
                self.data_available.notify_all();
            }
            PublishOutcome::Dropped => {
                log::trace!("Dropped message published with no subscribers");
            }
        }
        Ok(outcome)
    }

    /// Take the oldest unread message for `id`, blocking until one arrives.
    ///
    /// Returns `None` straight away if `id` is not subscribed, and also when
    /// `id` is unsubscribed (or the queue destroyed) while waiting.
    pub fn consume(&self, id: &K) -> QueueResult<Option<Arc<T>>> {
        let state = self.lock()?;
        if !state.is_subscribed(id) {
            return Ok(None);
        }

        let state = wait_while(
            &self.data_available,
            state,
            |s| s.is_subscribed(id) && s.cursor(id).is_none(),
            poisoned,
        )?;
        Ok(self.deliver_locked(state, id))
    }

    /// Like [`consume`](Self::consume) but waits at most `timeout`
    pub fn consume_timeout(&self, id: &K, timeout: Duration) -> QueueResult<Option<Arc<T>>> {
        let state = self.lock()?;
        if !state.is_subscribed(id) {
            return Ok(None);
        }

        let (state, result) = wait_timeout_while(
            &self.data_available,
            state,
            timeout,
            |s| s.is_subscribed(id) && s.cursor(id).is_none(),
            poisoned,
        )?;
        if result.timed_out() {
            return Err(QueueError::Timeout { waited: timeout });
        }
        Ok(self.deliver_locked(state, id))
    }

    /// Take the next message for `id` if one is already waiting
    pub fn try_consume(&self, id: &K) -> QueueResult<Option<Arc<T>>> {
        let state = self.lock()?;
        Ok(self.deliver_locked(state, id))
    }

    fn deliver_locked(
        &self,
        mut state: MutexGuard<'_, QueueState<T, K>>,
        id: &K,
    ) -> Option<Arc<T>> {
        let delivery = state.deliver_one(id)?;
        drop(state);

        log::trace!(
            "Delivered message {} to {:?}{}",
            delivery.sequence,
            id,
            if delivery.retired { " (retired)" } else { "" }
        );
        if delivery.retired {
            self.space_available.notify_all();
        }
        Some(delivery.payload)
    }

    /// Number of unread messages for `id`; 0 if not subscribed
    pub fn available(&self, id: &K) -> QueueResult<usize> {
        Ok(self.lock()?.available(id))
    }

    /// Change the capacity. Shrinking below the current size evicts the
    /// oldest messages whether or not they have been read (lossy).
    ///
    /// Returns the number of evicted messages.
    pub fn resize(&self, capacity: usize) -> QueueResult<usize> {
        let mut state = self.lock()?;
        let previous = state.capacity;
        let evicted = state.resize(capacity);
        let has_room = state.len() < capacity;
        drop(state);

        if evicted > 0 {
            log::warn!(
                "Resized queue {} -> {}, evicted {} unread messages",
                previous,
                capacity,
                evicted
            );
        } else {
            log::debug!("Resized queue {} -> {}", previous, capacity);
        }

        if has_room {
            self.space_available.notify_all();
        }
        Ok(evicted)
    }

    /// Force-retire the stored message carrying this exact payload handle
    pub fn remove_message(&self, payload: &Arc<T>) -> QueueResult<bool> {
        let removed = self.lock()?.remove_payload(payload);
        self.after_removal(removed);
        Ok(removed)
    }

    /// Force-retire the stored message with this sequence number
    pub fn remove_sequence(&self, sequence: Sequence) -> QueueResult<bool> {
        let removed = self.lock()?.remove_sequence(sequence);
        self.after_removal(removed);
        Ok(removed)
    }

    fn after_removal(&self, removed: bool) {
        if removed {
            log::debug!("Removed message out of band");
            self.space_available.notify_all();
        }
    }

    /// Release every stored message and subscriber.
    ///
    /// Blocked consumers return `None`, blocked and later publishers get
    /// `QueueError::Closed`. Calling this more than once is harmless.
    pub fn destroy(&self) -> QueueResult<()> {
        let mut state = self.lock()?;
        if state.closed {
            return Ok(());
        }
        let (messages, subscribers) = state.close();
        drop(state);

        log::debug!(
            "Destroyed queue, released {} messages and {} subscribers",
            messages,
            subscribers
        );
        self.data_available.notify_all();
        self.space_available.notify_all();
        Ok(())
    }

    pub fn is_closed(&self) -> QueueResult<bool> {
        Ok(self.lock()?.closed)
    }

    pub fn capacity(&self) -> QueueResult<usize> {
        Ok(self.lock()?.capacity)
    }

    /// Number of stored (not yet retired) messages
    pub fn len(&self) -> QueueResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> QueueResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn subscriber_count(&self) -> QueueResult<usize> {
        Ok(self.lock()?.subscriber_count())
    }

    pub fn subscriber_ids(&self) -> QueueResult<Vec<K>> {
        Ok(self.lock()?.subscriber_ids())
    }

    pub fn is_subscribed(&self, id: &K) -> QueueResult<bool> {
        Ok(self.lock()?.is_subscribed(id))
    }

    /// Payload of the oldest stored message
    pub fn front(&self) -> QueueResult<Option<Arc<T>>> {
        Ok(self.lock()?.front())
    }

    /// Sequence number and publish time of the oldest stored message
    pub fn front_header(&self) -> QueueResult<Option<MessageHeader>> {
        Ok(self.lock()?.front_header())
    }

    /// Readers still owed the message `sequence`, if it is stored
    pub fn pending_readers(&self, sequence: Sequence) -> QueueResult<Option<usize>> {
        Ok(self.lock()?.pending_readers(sequence))
    }

    pub fn stats(&self) -> QueueResult<QueueStats> {
        Ok(self.lock()?.stats())
    }

    pub fn lag_stats(&self) -> QueueResult<LagStats> {
        Ok(self.lock()?.lag_stats())
    }

    pub fn subscriber_info(&self) -> QueueResult<Vec<SubscriberInfo<K>>> {
        Ok(self.lock()?.subscriber_info())
    }

    /// Create a publisher handle for this queue
    pub fn publisher(self: &Arc<Self>, producer_id: impl Into<String>) -> QueuePublisher<T, K> {
        QueuePublisher::new(producer_id.into(), Arc::downgrade(self))
    }

    /// Subscribe `id` and return a handle that unsubscribes on drop
    pub fn consumer(self: &Arc<Self>, id: K) -> QueueResult<QueueConsumer<T, K>> {
        QueueConsumer::new(id, Arc::downgrade(self))
    }
}

impl<T, K> Debug for BroadcastQueue<T, K>
where
    K: Eq + Hash + Clone + Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.stats() {
            Ok(stats) => f
                .debug_struct("BroadcastQueue")
                .field("capacity", &stats.capacity)
                .field("size", &stats.size)
                .field("subscribers", &stats.subscribers)
                .finish(),
            Err(_) => f.debug_struct("BroadcastQueue").finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result: QueueResult<BroadcastQueue<u32, u32>> = BroadcastQueue::new(0);
        assert!(matches!(
            result,
            Err(QueueError::InvalidCapacity { capacity: 0 })
        ));
    }

    #[test]
    fn test_default_key_is_thread_id() {
        let queue: BroadcastQueue<u32> = BroadcastQueue::new(2).unwrap();
        let me = std::thread::current().id();

        assert!(queue.subscribe(me).unwrap());
        queue.publish(5u32).unwrap();
        assert_eq!(*queue.consume(&me).unwrap().unwrap(), 5);
    }

    #[test]
    fn test_consume_unknown_returns_none_without_blocking() {
        let queue: BroadcastQueue<u32, &str> = BroadcastQueue::new(2).unwrap();
        assert!(queue.consume(&"ghost").unwrap().is_none());
        assert_eq!(queue.available(&"ghost").unwrap(), 0);
        assert!(!queue.unsubscribe(&"ghost").unwrap());
    }

    #[test]
    fn test_try_publish_reports_full() {
        let queue: BroadcastQueue<u32, &str> = BroadcastQueue::new(1).unwrap();
        queue.subscribe("a").unwrap();
        queue.try_publish(1u32).unwrap();

        match queue.try_publish(2u32) {
            Err(QueueError::QueueFull { capacity }) => assert_eq!(capacity, 1),
            other => panic!("Expected QueueFull, got {:?}", other),
        }
    }

    #[test]
    fn test_front_header_tracks_oldest() {
        let queue: BroadcastQueue<u32, &str> = BroadcastQueue::new(3).unwrap();
        assert!(queue.front_header().unwrap().is_none());

        queue.subscribe("a").unwrap();
        queue.publish(1u32).unwrap();
        queue.publish(2u32).unwrap();
        assert_eq!(queue.front_header().unwrap().unwrap().sequence, 1);

        queue.consume(&"a").unwrap();
        let header = queue.front_header().unwrap().unwrap();
        assert_eq!(header.sequence, 2);
        assert!(header.timestamp <= std::time::SystemTime::now());
    }

    #[test]
    fn test_debug_shows_counters() {
        let queue: BroadcastQueue<u32, &str> = BroadcastQueue::new(3).unwrap();
        let rendered = format!("{:?}", queue);
        assert!(rendered.contains("capacity: 3"));
    }
}
