//! Lookup counters for the recency slot.

use std::fmt;

/// A point-in-time copy of an instance's lookup counters.
///
/// Counters are kept inside the instance's guard and updated by every
/// [`lookup`](super::ConcurrentSortedCache::lookup):
///
/// - `hits`: the key matched the cached element, no search was run
/// - `misses`: the cached element did not match and binary search found the key
/// - `not_found`: the key is not stored
///
/// Counters describe the instance, not the buffer: an ownership transfer
/// leaves both sides' counters untouched.
///
/// # Examples
///
/// ```rust
/// use sortmru::cache::ConcurrentSortedCache;
///
/// let cache = ConcurrentSortedCache::new([10, 20, 30]);
/// cache.lookup(&30); // search, slot moves to 30
/// cache.lookup(&30); // served from the slot
/// cache.lookup(&99); // absent
///
/// let statistics = cache.statistics();
/// assert_eq!(statistics.hits, 1);
/// assert_eq!(statistics.misses, 1);
/// assert_eq!(statistics.not_found, 1);
/// assert_eq!(statistics.lookups(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheStatistics {
    /// Lookups answered from the recency slot.
    pub hits: u64,
    /// Lookups that fell back to binary search and found the key.
    pub misses: u64,
    /// Lookups for keys that are not stored.
    pub not_found: u64,
}

impl CacheStatistics {
    /// Total number of lookups recorded.
    #[must_use]
    pub const fn lookups(&self) -> u64 {
        self.hits
            .saturating_add(self.misses)
            .saturating_add(self.not_found)
    }

    /// Fraction of lookups served by the recency slot, `0.0` before any lookup.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_ratio(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }

    pub(crate) const fn record_hit(&mut self) {
        self.hits = self.hits.saturating_add(1);
    }

    pub(crate) const fn record_miss(&mut self) {
        self.misses = self.misses.saturating_add(1);
    }

    pub(crate) const fn record_not_found(&mut self) {
        self.not_found = self.not_found.saturating_add(1);
    }
}

impl fmt::Display for CacheStatistics {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "hits={} misses={} not_found={}",
            self.hits, self.misses, self.not_found
        )
    }
}
