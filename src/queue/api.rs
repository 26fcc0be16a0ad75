//! Public API for the queue system
//!
//! External modules should import from here rather than directly from the
//! internal modules. See the module documentation for usage and architecture.

// Core queue and handles
pub use crate::queue::broadcast::BroadcastQueue;
pub use crate::queue::consumer::QueueConsumer;
pub use crate::queue::publisher::QueuePublisher;

// Message types
pub use crate::queue::message::{MessageHeader, PublishOutcome, Sequence};

// Configuration
pub use crate::queue::config::{ConfigError, QueueConfig, DEFAULT_CAPACITY};

// Error handling
pub use crate::queue::error::{QueueError, QueueResult};

// Statistics
pub use crate::queue::types::{LagStats, QueueStats, SubscriberInfo};
