//! # sortmru
//!
//! A thread-safe sorted collection that remembers where it last found
//! something.
//!
//! ## Overview
//!
//! [`ConcurrentSortedCache`](cache::ConcurrentSortedCache) sorts its input
//! once and then answers point lookups by checking the most recently found
//! position before falling back to binary search. Its whole storage can be
//! moved to another instance while other threads keep reading either side:
//! both instances are locked together in a global order, and the cached
//! position is always recomputed for the buffer it ends up on.
//!
//! ## Feature Flags
//!
//! - `serde`: `Serialize`/`Deserialize` for the cache and its statistics
//!
//! Building with `RUSTFLAGS="--cfg loom"` replaces the locks and atomics with
//! `loom`'s model-checked versions for the loom test suite.
//!
//! ## Example
//!
//! ```rust
//! use sortmru::prelude::*;
//!
//! let cache = ConcurrentSortedCache::new([50, 10, 40, 20, 30]);
//! assert_eq!(cache.size(), 5);
//! assert_eq!(cache.lookup(&40), Some(40));
//! assert_eq!(cache.lookup(&99), None);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use sortmru::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cache::*;
}

pub mod cache;

mod sync;
