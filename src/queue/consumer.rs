//! Queue Consumer for reading broadcast messages
//!
//! A consumer is a subscription with a lifetime: it registers its id with the
//! queue on creation and unregisters on drop, which releases any messages it
//! never got round to reading.

use crate::queue::broadcast::BroadcastQueue;
use crate::queue::error::{QueueError, QueueResult};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Consumer handle for reading messages from the queue
///
/// Each consumer has its own cursor, so it reads at its own pace without
/// affecting other consumers.
///
/// # Example
///
/// ```rust
/// use broadcastq::queue::BroadcastQueue;
/// use std::sync::Arc;
///
/// let queue: Arc<BroadcastQueue<u32, &str>> = Arc::new(BroadcastQueue::new(16).unwrap());
/// let consumer = queue.consumer("metrics").unwrap();
///
/// for n in 0..3u32 {
///     queue.publish(n).unwrap();
/// }
///
/// let batch = consumer.read_batch(10).unwrap();
/// assert_eq!(batch.len(), 3);
/// ```
pub struct QueueConsumer<T, K>
where
    K: Eq + Hash + Clone + Debug,
{
    id: K,
    queue: Weak<BroadcastQueue<T, K>>,
}

impl<T, K> QueueConsumer<T, K>
where
    K: Eq + Hash + Clone + Debug,
{
    pub(crate) fn new(id: K, queue: Weak<BroadcastQueue<T, K>>) -> QueueResult<Self> {
        let strong = queue.upgrade().ok_or(QueueError::QueueDropped)?;
        strong.subscribe(id.clone())?;
        Ok(Self { id, queue })
    }

    pub fn id(&self) -> &K {
        &self.id
    }

    fn queue(&self) -> QueueResult<Arc<BroadcastQueue<T, K>>> {
        self.queue.upgrade().ok_or(QueueError::QueueDropped)
    }

    /// Read the next message, blocking until one is published.
    ///
    /// Returns `None` if the subscription was cancelled in the meantime.
    pub fn read(&self) -> QueueResult<Option<Arc<T>>> {
        self.queue()?.consume(&self.id)
    }

    pub fn read_timeout(&self, timeout: Duration) -> QueueResult<Option<Arc<T>>> {
        self.queue()?.consume_timeout(&self.id, timeout)
    }

    /// Read the next message if one is already waiting
    pub fn try_read(&self) -> QueueResult<Option<Arc<T>>> {
        self.queue()?.try_consume(&self.id)
    }

    /// Read up to `batch_size` messages without blocking
    pub fn read_batch(&self, batch_size: usize) -> QueueResult<Vec<Arc<T>>> {
        let queue = self.queue()?;
        let mut batch = Vec::with_capacity(batch_size);

        for _ in 0..batch_size {
            match queue.try_consume(&self.id)? {
                Some(message) => batch.push(message),
                None => break,
            }
        }

        Ok(batch)
    }

    /// Unread messages waiting for this consumer
    pub fn available(&self) -> QueueResult<usize> {
        self.queue()?.available(&self.id)
    }
}

impl<T, K> Drop for QueueConsumer<T, K>
where
    K: Eq + Hash + Clone + Debug,
{
    fn drop(&mut self) {
        if let Some(queue) = self.queue.upgrade() {
            if let Err(e) = queue.unsubscribe(&self.id) {
                log::warn!("Failed to unsubscribe {:?} on drop: {}", self.id, e);
            }
        }
    }
}

impl<T, K> Debug for QueueConsumer<T, K>
where
    K: Eq + Hash + Clone + Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueConsumer").field("id", &self.id).finish()
    }
}
