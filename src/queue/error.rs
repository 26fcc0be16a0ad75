//! Queue Error Types

use crate::core::error_handling::ContextualError;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Invalid queue capacity: {capacity} (must be greater than zero)")]
    InvalidCapacity { capacity: usize },

    #[error("Queue is full (capacity: {capacity})")]
    QueueFull { capacity: usize },

    #[error("Timed out after {waited:?}")]
    Timeout { waited: Duration },

    #[error("Queue has been destroyed")]
    Closed,

    #[error("Queue no longer exists")]
    QueueDropped,

    #[error("Lock poisoned: {message}")]
    Poisoned { message: String },
}

impl QueueError {
    /// Whether the caller can reasonably retry the same operation later
    pub fn is_transient(&self) -> bool {
        matches!(self, QueueError::QueueFull { .. } | QueueError::Timeout { .. })
    }
}

impl ContextualError for QueueError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, QueueError::InvalidCapacity { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            QueueError::InvalidCapacity { .. } => Some("Queue capacity must be at least 1"),
            _ => None,
        }
    }
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
