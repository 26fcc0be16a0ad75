//! Type definitions for the queue system
//!
//! Statistics snapshots returned by the queue. They are plain values copied
//! out under the lock, so reading them never holds up producers or consumers.

use crate::queue::message::Sequence;
use std::time::Duration;

/// Point-in-time counters for a queue
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueueStats {
    /// Maximum number of stored messages
    pub capacity: usize,
    /// Messages currently stored
    pub size: usize,
    /// Active subscribers
    pub subscribers: usize,
    /// Sequence the next published message will receive
    pub next_sequence: Sequence,
    /// Messages appended to the store
    pub published: u64,
    /// Payloads discarded because nobody was subscribed
    pub dropped: u64,
    /// Messages removed after their last pending reader consumed them or left
    pub retired: u64,
    /// Messages removed regardless of pending readers (shrink or out-of-band)
    pub evicted: u64,
}

/// Consumer lag statistics, lag being the number of unread stored messages
#[derive(Debug, Clone, PartialEq)]
pub struct LagStats {
    /// Total number of active consumers
    pub total_consumers: usize,
    /// Maximum lag among all consumers
    pub max_lag: usize,
    /// Minimum lag among all consumers
    pub min_lag: usize,
    /// Average lag across all consumers
    pub avg_lag: f64,
}

impl LagStats {
    pub fn from_lags(lags: &[usize]) -> Self {
        if lags.is_empty() {
            return Self {
                total_consumers: 0,
                max_lag: 0,
                min_lag: 0,
                avg_lag: 0.0,
            };
        }

        Self {
            total_consumers: lags.len(),
            max_lag: lags.iter().copied().max().unwrap_or(0),
            min_lag: lags.iter().copied().min().unwrap_or(0),
            avg_lag: lags.iter().sum::<usize>() as f64 / lags.len() as f64,
        }
    }
}

/// Information about a single subscriber
#[derive(Debug, Clone)]
pub struct SubscriberInfo<K> {
    pub id: K,
    /// Unread stored messages
    pub lag: usize,
    /// Messages consumed so far
    pub delivered: u64,
    /// Time since the last read, or since subscribing if nothing was read yet
    pub idle: Duration,
}
