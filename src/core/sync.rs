//! Synchronization utilities for robust mutex handling
//!
//! This module provides utilities for handling mutex poisoning and condition
//! variable waits in a consistent manner across the codebase.

use std::sync::{Condvar, LockResult, MutexGuard, WaitTimeoutResult};
use std::time::Duration;

/// Handle poisoned mutex cases with consistent error handling
///
/// Converts mutex poison errors into application-specific errors using a
/// provided error constructor. A mutex is poisoned when a thread panics while
/// holding it.
///
/// # Arguments
/// * `result` - The result from a mutex lock operation
/// * `error_constructor` - Function to create the appropriate error type
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use broadcastq::core::sync::handle_mutex_poison;
/// use broadcastq::queue::QueueError;
///
/// let mutex = Mutex::new(42);
/// let guard = handle_mutex_poison(
///     mutex.lock(),
///     |message| QueueError::Poisoned { message }
/// ).unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|poison_err| {
        error_constructor(
            format!(
                "Internal synchronisation error (mutex poisoned). This indicates a panic occurred while holding a lock. PoisonError: {:?}",
                poison_err
            )
        )
    })
}

/// Block on `condvar` until `condition` returns false
///
/// The predicate is re-evaluated under the lock after every wakeup, so
/// spurious wakeups and notifications meant for other waiters are harmless.
pub fn wait_while<'a, T, E>(
    condvar: &Condvar,
    guard: MutexGuard<'a, T>,
    condition: impl FnMut(&mut T) -> bool,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<MutexGuard<'a, T>, E> {
    handle_mutex_poison(condvar.wait_while(guard, condition), error_constructor)
}

/// Like [`wait_while`] but gives up after `timeout`
///
/// The returned `WaitTimeoutResult` reports whether the wait ended because
/// the deadline passed while the condition still held.
pub fn wait_timeout_while<'a, T, E>(
    condvar: &Condvar,
    guard: MutexGuard<'a, T>,
    timeout: Duration,
    condition: impl FnMut(&mut T) -> bool,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<(MutexGuard<'a, T>, WaitTimeoutResult), E> {
    handle_mutex_poison(
        condvar.wait_timeout_while(guard, timeout, condition),
        error_constructor,
    )
}
