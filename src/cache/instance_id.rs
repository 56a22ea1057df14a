//! Instance identity and the joint-lock primitive built on it.
//!
//! Two instances are locked together by always acquiring the lock of the
//! instance with the smaller [`InstanceId`] first. Every thread therefore
//! agrees on one global acquisition order, and a transfer `a <- b` racing a
//! transfer `b <- a` cannot deadlock.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::sync::{Mutex, MutexGuard};

/// Process-wide counter. Plain `std` atomic even under loom: ids only need
/// to be unique, and loom atomics cannot live in a `static`.
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// A process-unique identity assigned to every cache instance at construction.
///
/// Identities are never reused and do not change when the instance is moved
/// in memory, which makes them a stable lock-ordering key.
///
/// # Examples
///
/// ```rust
/// use sortmru::cache::ConcurrentSortedCache;
///
/// let first = ConcurrentSortedCache::new([1, 2, 3]);
/// let second = ConcurrentSortedCache::new([4, 5, 6]);
/// assert_ne!(first.id(), second.id());
/// assert!(first.id().get() < second.id().get());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    pub(crate) fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric identity.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// Locks two distinct instances as one step.
///
/// Guards are returned in argument order but acquired in [`InstanceId`]
/// order. Returns `None` without locking anything when both ids are equal,
/// since locking an instance against itself would deadlock.
pub(crate) fn lock_pair<'a, T>(
    first: (InstanceId, &'a Mutex<T>),
    second: (InstanceId, &'a Mutex<T>),
) -> Option<(MutexGuard<'a, T>, MutexGuard<'a, T>)> {
    let (first_id, first_lock) = first;
    let (second_id, second_lock) = second;

    match first_id.cmp(&second_id) {
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Less => {
            let first_guard = first_lock.lock();
            let second_guard = second_lock.lock();
            Some((first_guard, second_guard))
        }
        std::cmp::Ordering::Greater => {
            let second_guard = second_lock.lock();
            let first_guard = first_lock.lock();
            Some((first_guard, second_guard))
        }
    }
}
