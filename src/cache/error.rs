//! Error types for cache operations.
//!
//! Lookups never fail: a missing key is `None`. Errors only arise from the
//! positional accessors, whose index can fall outside the stored sequence.

use thiserror::Error;

/// Errors returned by fallible [`ConcurrentSortedCache`](super::ConcurrentSortedCache)
/// operations.
///
/// # Examples
///
/// ```rust
/// use sortmru::cache::{ConcurrentSortedCache, SortedCacheError};
///
/// let cache = ConcurrentSortedCache::new([3, 1, 2]);
/// assert_eq!(cache.try_get_at(0), Ok(1));
/// assert_eq!(
///     cache.try_get_at(3),
///     Err(SortedCacheError::IndexOutOfBounds { index: 3, len: 3 })
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SortedCacheError {
    /// A positional access went past the end of the stored sequence.
    #[error("index {index} out of bounds for sorted cache of length {len}")]
    IndexOutOfBounds {
        /// The requested position.
        index: usize,
        /// The length of the sequence at the time of the access.
        len: usize,
    },
}

impl SortedCacheError {
    /// Returns `true` if this is an [`IndexOutOfBounds`](Self::IndexOutOfBounds) error.
    #[must_use]
    pub const fn is_index_out_of_bounds(&self) -> bool {
        matches!(self, Self::IndexOutOfBounds { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn index_out_of_bounds_display() {
        let error = SortedCacheError::IndexOutOfBounds { index: 9, len: 5 };
        assert_eq!(
            error.to_string(),
            "index 9 out of bounds for sorted cache of length 5"
        );
        assert!(error.is_index_out_of_bounds());
    }

    #[rstest]
    fn implements_std_error() {
        fn assert_error<E: std::error::Error + Send + Sync + 'static>(_: &E) {}
        assert_error(&SortedCacheError::IndexOutOfBounds { index: 0, len: 0 });
    }
}
