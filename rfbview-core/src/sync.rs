//! Mutex poisoning recovery

use std::sync::{Mutex, MutexGuard};

/// Locks a mutex, recovering the inner value if a thread panicked while
/// holding it.
///
/// Every mutex in this crate guards a channel end, a thread handle or a
/// weak pointer, all of which stay valid after a panic.
pub(crate) fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Mutex was poisoned, recovering inner value");
            poisoned.into_inner()
        }
    }
}
