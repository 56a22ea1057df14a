//! Sorted collections with a recency cache.
//!
//! This module provides:
//!
//! - [`ConcurrentSortedCache`]: a thread-safe sorted sequence with a
//!   single-slot most-recently-used lookup cache and lock-ordered ownership
//!   transfer
//! - [`InstanceId`]: the identity that orders lock acquisition between instances
//! - [`CacheStatistics`]: per-instance lookup counters
//! - [`SortedCacheError`]: errors from positional access
//!
//! # Examples
//!
//! ```rust
//! use sortmru::cache::ConcurrentSortedCache;
//!
//! let source = ConcurrentSortedCache::new([10, 20, 30, 40, 50]);
//! let destination = ConcurrentSortedCache::take_from(&source);
//!
//! assert_eq!(destination.size(), 5);
//! assert_eq!(destination.lookup(&10), Some(10));
//! assert_eq!(source.size(), 0);
//! assert_eq!(source.lookup(&10), None);
//! ```

mod cache_slot;
mod concurrent_sorted_cache;
mod error;
mod instance_id;
mod statistics;

pub use concurrent_sorted_cache::ConcurrentSortedCache;
pub use error::SortedCacheError;
pub use instance_id::InstanceId;
pub use statistics::CacheStatistics;
