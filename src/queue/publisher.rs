//! Queue Publisher for sending messages
//!
//! Publishers send payloads to a broadcast queue where they become available
//! to every consumer subscribed at that moment. A publisher only holds a weak
//! reference, so it never keeps a destroyed queue alive.

use crate::queue::broadcast::BroadcastQueue;
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::message::PublishOutcome;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Publisher handle for sending messages to the queue
///
/// # Example
///
/// ```rust
/// use broadcastq::queue::BroadcastQueue;
/// use std::sync::Arc;
///
/// let queue: Arc<BroadcastQueue<String, u32>> = Arc::new(BroadcastQueue::new(4).unwrap());
/// let publisher = queue.publisher("ingest");
/// let consumer = queue.consumer(1).unwrap();
///
/// let outcome = publisher.publish("event".to_string()).unwrap();
/// assert!(outcome.is_queued());
/// assert_eq!(consumer.read().unwrap().unwrap().as_str(), "event");
/// ```
pub struct QueuePublisher<T, K> {
    producer_id: String,
    queue: Weak<BroadcastQueue<T, K>>,
}

impl<T, K> QueuePublisher<T, K>
where
    K: Eq + Hash + Clone + Debug,
{
    pub(crate) fn new(producer_id: String, queue: Weak<BroadcastQueue<T, K>>) -> Self {
        Self { producer_id, queue }
    }

    pub fn producer_id(&self) -> &str {
        &self.producer_id
    }

    fn queue(&self) -> QueueResult<Arc<BroadcastQueue<T, K>>> {
        self.queue.upgrade().ok_or(QueueError::QueueDropped)
    }

    /// Publish a payload, blocking while the queue is full
    pub fn publish(&self, payload: impl Into<Arc<T>>) -> QueueResult<PublishOutcome> {
        let outcome = self.queue()?.publish(payload)?;
        if outcome == PublishOutcome::Dropped {
            log::trace!("{}: message dropped, no subscribers", self.producer_id);
        }
        Ok(outcome)
    }

    pub fn publish_timeout(
        &self,
        payload: impl Into<Arc<T>>,
        timeout: Duration,
    ) -> QueueResult<PublishOutcome> {
        self.queue()?.publish_timeout(payload, timeout)
    }

    pub fn try_publish(&self, payload: impl Into<Arc<T>>) -> QueueResult<PublishOutcome> {
        self.queue()?.try_publish(payload)
    }
}

impl<T, K> Clone for QueuePublisher<T, K> {
    fn clone(&self) -> Self {
        Self {
            producer_id: self.producer_id.clone(),
            queue: Weak::clone(&self.queue),
        }
    }
}

impl<T, K> Debug for QueuePublisher<T, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuePublisher")
            .field("producer_id", &self.producer_id)
            .finish()
    }
}
