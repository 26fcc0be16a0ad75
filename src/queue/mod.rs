//! Broadcast Queue Component
//!
//! A bounded, in-process broadcast queue for multiple concurrent producers
//! and consumers. Every message is delivered once to each consumer that was
//! subscribed when it was published, and it is retired from the shared store
//! once all of them have read it or left.
//!
//! # Overview
//!
//! - **Multiple Producers**: Any number of threads can publish concurrently
//! - **Multiple Consumers**: Each consumer keeps an independent cursor
//! - **Sequence Ordering**: Monotonic sequence numbers give FIFO delivery per consumer
//! - **Shared Payloads**: Arc-wrapped payloads are shared, never copied, between consumers
//! - **Backpressure**: Publishing blocks while the store is at capacity
//! - **Dynamic Membership**: Subscribing and unsubscribing is safe mid-flight
//! - **Lossy Resize**: Shrinking the capacity evicts the oldest messages
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Producer A  │     │  Producer B  │     │  Producer C  │
//! └──────┬───────┘     └──────┬───────┘     └──────┬───────┘
//!        │ publish (blocks while full)             │
//!        ▼                    ▼                    ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │          BroadcastQueue (Mutex + 2 Condvars)            │
//! │  ┌─────────────────────────────────────────────────┐    │
//! │  │   MessageStore (sequence -> pending_readers)    │    │
//! │  │  ┌───┬───┬───┬───┬───┬───┐                      │    │
//! │  │  │ 4 │ 5 │ 6 │ 7 │ 8 │ 9 │  capacity = 6        │    │
//! │  │  └───┴───┴───┴───┴───┴───┘                      │    │
//! │  │    ▲       ▲           ▲                        │    │
//! │  └────┼───────┼───────────┼────────────────────────┘    │
//! │       │  SubscriberRegistry (cursor per subscriber)     │
//! └───────┼───────┼───────────┼─────────────────────────────┘
//!         │ consume (blocks while own cursor is empty)
//! ┌───────┴───┐ ┌─┴────────┐ ┌┴─────────┐
//! │Consumer A │ │Consumer B│ │Consumer C│
//! └───────────┘ └──────────┘ └──────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use broadcastq::queue::{BroadcastQueue, PublishOutcome};
//! use std::sync::Arc;
//!
//! let queue: Arc<BroadcastQueue<String, &str>> = Arc::new(BroadcastQueue::new(4).unwrap());
//!
//! // Nobody is listening yet, so this is discarded
//! assert_eq!(queue.publish("early".to_string()).unwrap(), PublishOutcome::Dropped);
//!
//! let audit = queue.consumer("audit").unwrap();
//! let metrics = queue.consumer("metrics").unwrap();
//!
//! queue.publish("event-1".to_string()).unwrap();
//!
//! assert_eq!(audit.read().unwrap().unwrap().as_str(), "event-1");
//! assert_eq!(metrics.read().unwrap().unwrap().as_str(), "event-1");
//! assert!(queue.is_empty().unwrap());
//! ```

pub mod api;
mod broadcast;
pub mod config;
mod consumer;
mod error;
mod message;
mod publisher;
mod registry;
mod state;
mod store;
mod types;

pub use broadcast::BroadcastQueue;
pub use config::{ConfigError, QueueConfig};
pub use consumer::QueueConsumer;
pub use error::{QueueError, QueueResult};
pub use message::{MessageHeader, PublishOutcome, Sequence};
pub use publisher::QueuePublisher;
pub use types::{LagStats, QueueStats, SubscriberInfo};

#[cfg(test)]
mod tests;
