//! Thread-safe sorted collection with a single-slot recency cache.
//!
//! This module provides [`ConcurrentSortedCache`], a fixed-content sorted
//! sequence that answers point lookups by first checking the position of the
//! most recently found element and only then falling back to binary search.
//!
//! # Overview
//!
//! - The sequence is sorted once, at construction, and never edited.
//! - The recency slot is an index into that sequence. It lives under the same
//!   lock as the sequence, so no thread can observe one without the other.
//! - The whole sequence can be moved to another instance with
//!   [`take_from`](ConcurrentSortedCache::take_from) (move-construct) or
//!   [`transfer_from`](ConcurrentSortedCache::transfer_from) (move-assign),
//!   even while other threads are reading either side.
//!
//! # Time Complexity
//!
//! | Operation        | Complexity                      |
//! |------------------|---------------------------------|
//! | `new`            | O(n log n)                      |
//! | `lookup`         | O(1) slot hit, O(log n) otherwise |
//! | `get_at`         | O(1)                            |
//! | `size`           | O(1), lock-free                 |
//! | `transfer_from`  | O(1) plus dropping the old buffer |
//! | `snapshot`       | O(n)                            |
//!
//! # State Transitions
//!
//! ```text
//!              new(non-empty) / receive non-empty
//!     Empty ───────────────────────────────────────► Populated
//!       ▲                                               │
//!       │            act as transfer source             │
//!       └───────────────────────────────────────────────┘
//! ```
//!
//! `lookup` never changes the state. Both states accept every operation.
//!
//! # Examples
//!
//! ```rust
//! use sortmru::cache::ConcurrentSortedCache;
//!
//! let cache = ConcurrentSortedCache::new([50, 10, 40, 20, 30]);
//! assert_eq!(cache.size(), 5);
//! assert_eq!(cache.lookup(&40), Some(40));
//! assert_eq!(cache.lookup(&99), None);
//!
//! let destination = ConcurrentSortedCache::default();
//! destination.transfer_from(&cache);
//! assert_eq!(destination.size(), 5);
//! assert_eq!(cache.size(), 0);
//! assert_eq!(cache.lookup(&10), None);
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::mem;

use super::cache_slot::CacheSlot;
use super::error::SortedCacheError;
use super::instance_id::{InstanceId, lock_pair};
use super::statistics::CacheStatistics;
use crate::sync::{AtomicUsize, Mutex, Ordering};

/// Everything protected by an instance's guard.
struct GuardedState<T> {
    sequence: Vec<T>,
    slot: CacheSlot,
    statistics: CacheStatistics,
}

impl<T> GuardedState<T> {
    fn new(sequence: Vec<T>) -> Self {
        Self {
            slot: CacheSlot::first_of(&sequence),
            sequence,
            statistics: CacheStatistics::default(),
        }
    }

    /// Installs `sequence` and points the slot at its head.
    ///
    /// Returns the previous buffer so the caller can drop it outside the lock.
    fn replace_sequence(&mut self, sequence: Vec<T>) -> Vec<T> {
        let previous = mem::replace(&mut self.sequence, sequence);
        self.reset_slot();
        previous
    }

    /// Empties the sequence and the slot, returning the old buffer.
    fn take_sequence(&mut self) -> Vec<T> {
        self.replace_sequence(Vec::new())
    }

    fn reset_slot(&mut self) {
        self.slot = CacheSlot::first_of(&self.sequence);
    }
}

impl<T: Ord> GuardedState<T> {
    /// Slot check, then lower-bound search. Moves the slot on a search hit.
    fn find<Q>(&mut self, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if self
            .slot
            .resolve(&self.sequence)
            .is_some_and(|cached| cached.borrow() == key)
        {
            self.statistics.record_hit();
            return self.slot.resolve(&self.sequence);
        }

        let position = self
            .sequence
            .partition_point(|element| element.borrow() < key);
        match self.sequence.get(position) {
            Some(element) if element.borrow() == key => {
                self.slot.reposition(position);
                self.statistics.record_miss();
                Some(element)
            }
            _ => {
                self.statistics.record_not_found();
                None
            }
        }
    }
}

/// A thread-safe, sorted, fixed-content collection with a recency cache.
///
/// Elements are sorted ascending once, at construction. Point lookups check
/// the most recently found position before running a binary search, so
/// repeated lookups of the same key cost O(1).
///
/// The sequence and the recency slot are protected together by one lock per
/// instance. Lookups take that lock (they move the slot), so lookups on one
/// instance are serialized.
///
/// # Type Parameters
///
/// * `T` - The element type, `i32` by default. Lookups return clones, so
///   cheap `Clone` types fit best.
///
/// # Ownership Transfer
///
/// The storage of one instance can be moved into another:
///
/// - [`take_from`](Self::take_from) builds a new instance from the source's
///   storage (move-construct).
/// - [`transfer_from`](Self::transfer_from) replaces an existing instance's
///   storage (move-assign). Both guards are acquired as one step, ordered by
///   [`InstanceId`], so opposing transfers cannot deadlock.
///
/// In both cases the recency slot of the receiver is recomputed from the new
/// buffer and the source is left empty but usable. Transferring an instance
/// into itself does nothing.
///
/// # Size Reads
///
/// [`size`](Self::size) reads an atomic length mirror without taking the lock.
/// The mirror is written while the guard is held, so a thread sees the
/// effect of its own transfers, but a reader racing another thread's transfer
/// may see the length from just before or just after it. Use
/// [`synchronized_size`](Self::synchronized_size) when the length must agree
/// with the contents observed under the same lock.
///
/// # Examples
///
/// ```rust
/// use sortmru::cache::ConcurrentSortedCache;
/// use std::sync::Arc;
/// use std::thread;
///
/// let cache = Arc::new(ConcurrentSortedCache::new(0..1000));
///
/// let handles: Vec<_> = (0..4)
///     .map(|offset| {
///         let cache = Arc::clone(&cache);
///         thread::spawn(move || cache.lookup(&(offset * 100)))
///     })
///     .collect();
///
/// for (offset, handle) in handles.into_iter().enumerate() {
///     assert_eq!(handle.join().unwrap(), Some(offset as i32 * 100));
/// }
/// ```
pub struct ConcurrentSortedCache<T = i32> {
    id: InstanceId,
    len: AtomicUsize,
    state: Mutex<GuardedState<T>>,
}

static_assertions::assert_impl_all!(ConcurrentSortedCache<i32>: Send, Sync);
static_assertions::assert_impl_all!(ConcurrentSortedCache<String>: Send, Sync);

impl<T: Ord + Clone> ConcurrentSortedCache<T> {
    /// Builds a cache from `values`, sorting them ascending.
    ///
    /// Duplicates are kept. An empty input yields a valid empty cache.
    /// The recency slot starts on the smallest element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sortmru::cache::ConcurrentSortedCache;
    ///
    /// let cache = ConcurrentSortedCache::new(vec![3, 1, 2, 1]);
    /// assert_eq!(cache.snapshot(), vec![1, 1, 2, 3]);
    /// assert_eq!(cache.cached_value(), Some(1));
    /// ```
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut sequence: Vec<T> = values.into_iter().collect();
        sequence.sort();
        Self::from_sorted(sequence)
    }

    /// Builds a cache from a copy of `values`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sortmru::cache::ConcurrentSortedCache;
    ///
    /// let values = [50, 10, 40];
    /// let cache = ConcurrentSortedCache::from_slice(&values);
    /// assert_eq!(cache.snapshot(), vec![10, 40, 50]);
    /// ```
    pub fn from_slice(values: &[T]) -> Self {
        Self::new(values.iter().cloned())
    }

    fn from_sorted(sequence: Vec<T>) -> Self {
        debug_assert!(
            sequence.is_sorted(),
            "ConcurrentSortedCache: sequence must be sorted ascending"
        );
        let cache = Self {
            id: InstanceId::next(),
            len: AtomicUsize::new(sequence.len()),
            state: Mutex::new(GuardedState::new(sequence)),
        };
        tracing::debug!(instance = %cache.id, len = cache.size(), "sorted cache constructed");
        cache
    }

    /// Looks up `key` by value.
    ///
    /// Returns a clone of the stored element equal to `key`, or `None` if no
    /// such element exists. The recency slot is checked first; on a slot miss
    /// a binary search runs and, if it finds the key, the slot moves to it.
    /// A failed lookup leaves the slot where it was.
    ///
    /// # Complexity
    ///
    /// O(1) when `key` equals the cached element, O(log n) otherwise.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sortmru::cache::ConcurrentSortedCache;
    ///
    /// let cache = ConcurrentSortedCache::new([50, 10, 40, 20, 30]);
    /// assert_eq!(cache.lookup(&40), Some(40));
    /// assert_eq!(cache.cached_value(), Some(40));
    ///
    /// assert_eq!(cache.lookup(&99), None);
    /// assert_eq!(cache.cached_value(), Some(40));
    ///
    /// // Borrowed keys work for owned element types.
    /// let names = ConcurrentSortedCache::new(["b".to_string(), "a".to_string()]);
    /// assert_eq!(names.lookup("a"), Some("a".to_string()));
    /// ```
    pub fn lookup<Q>(&self, key: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut state = self.state.lock();
        let found = state.find(key).cloned();
        tracing::trace!(instance = %self.id, found = found.is_some(), "lookup");
        found
    }

    /// Returns `true` if an element equal to `key` is stored.
    ///
    /// Runs a [`lookup`](Self::lookup), so it moves the recency slot the same way.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.lookup(key).is_some()
    }

    /// Returns the element at sorted position `index`, or `None` past the end.
    ///
    /// Positional access is separate from [`lookup`](Self::lookup): it does
    /// not consult or move the recency slot and is not counted in
    /// [`statistics`](Self::statistics).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sortmru::cache::ConcurrentSortedCache;
    ///
    /// let cache = ConcurrentSortedCache::new([30, 10, 20]);
    /// assert_eq!(cache.get_at(0), Some(10));
    /// assert_eq!(cache.get_at(2), Some(30));
    /// assert_eq!(cache.get_at(3), None);
    /// ```
    pub fn get_at(&self, index: usize) -> Option<T> {
        self.state.lock().sequence.get(index).cloned()
    }

    /// Returns the element at sorted position `index`.
    ///
    /// # Errors
    ///
    /// Returns [`SortedCacheError::IndexOutOfBounds`] when `index` is not less
    /// than the current length.
    pub fn try_get_at(&self, index: usize) -> Result<T, SortedCacheError> {
        let state = self.state.lock();
        state
            .sequence
            .get(index)
            .cloned()
            .ok_or_else(|| SortedCacheError::IndexOutOfBounds {
                index,
                len: state.sequence.len(),
            })
    }

    /// Moves the entire storage of `source` into a new instance.
    ///
    /// Only the source's guard is taken: the new instance is not reachable by
    /// any other thread yet. Afterwards `source` is empty and every lookup on
    /// it returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sortmru::cache::ConcurrentSortedCache;
    ///
    /// let source = ConcurrentSortedCache::new([10, 20, 30]);
    /// let destination = ConcurrentSortedCache::take_from(&source);
    ///
    /// assert_eq!(destination.size(), 3);
    /// assert_eq!(destination.lookup(&10), Some(10));
    /// assert!(source.is_empty());
    /// assert_eq!(source.lookup(&10), None);
    /// ```
    pub fn take_from(source: &Self) -> Self {
        let sequence = {
            let mut source_state = source.state.lock();
            let sequence = source_state.take_sequence();
            source.len.store(0, Ordering::Release);
            sequence
        };
        let moved = sequence.len();
        let destination = Self::from_sorted(sequence);
        tracing::debug!(
            source = %source.id,
            destination = %destination.id,
            moved,
            "sorted cache storage taken"
        );
        destination
    }

    /// Replaces this instance's storage with the entire storage of `source`.
    ///
    /// Both guards are acquired together, lower [`InstanceId`] first, and held
    /// for the whole transfer. A reader of either instance sees the state
    /// strictly before or strictly after it. The previous contents of `self`
    /// are dropped, the recency slot of `self` is recomputed from the received
    /// buffer, and `source` is left empty.
    ///
    /// Transferring an instance into itself is a no-op.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sortmru::cache::ConcurrentSortedCache;
    ///
    /// let source = ConcurrentSortedCache::new([10, 20, 30, 40, 50]);
    /// let destination = ConcurrentSortedCache::new([99, 88]);
    ///
    /// destination.transfer_from(&source);
    /// assert_eq!(destination.size(), 5);
    /// assert_eq!(destination.lookup(&20), Some(20));
    /// assert_eq!(destination.lookup(&99), None);
    /// assert_eq!(source.size(), 0);
    ///
    /// destination.transfer_from(&destination);
    /// assert_eq!(destination.size(), 5);
    /// ```
    pub fn transfer_from(&self, source: &Self) {
        let discarded = {
            let Some((mut destination_state, mut source_state)) =
                lock_pair((self.id, &self.state), (source.id, &source.state))
            else {
                tracing::trace!(instance = %self.id, "self-transfer ignored");
                return;
            };

            let sequence = source_state.take_sequence();
            source.len.store(0, Ordering::Release);

            let moved = sequence.len();
            let discarded = destination_state.replace_sequence(sequence);
            self.len.store(moved, Ordering::Release);

            tracing::debug!(
                source = %source.id,
                destination = %self.id,
                moved,
                discarded = discarded.len(),
                "sorted cache storage transferred"
            );
            discarded
        };
        drop(discarded);
    }

    /// Exchanges the storage of `self` and `other`.
    ///
    /// Uses the same joint lock as [`transfer_from`](Self::transfer_from).
    /// Both recency slots are recomputed for the buffers they now sit on.
    /// Swapping an instance with itself is a no-op.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sortmru::cache::ConcurrentSortedCache;
    ///
    /// let left = ConcurrentSortedCache::new([1, 2, 3]);
    /// let right = ConcurrentSortedCache::new([7]);
    /// left.swap_with(&right);
    ///
    /// assert_eq!(left.snapshot(), vec![7]);
    /// assert_eq!(right.snapshot(), vec![1, 2, 3]);
    /// ```
    pub fn swap_with(&self, other: &Self) {
        let Some((mut own_state, mut other_state)) =
            lock_pair((self.id, &self.state), (other.id, &other.state))
        else {
            tracing::trace!(instance = %self.id, "self-swap ignored");
            return;
        };

        mem::swap(&mut own_state.sequence, &mut other_state.sequence);
        own_state.reset_slot();
        other_state.reset_slot();
        self.len.store(own_state.sequence.len(), Ordering::Release);
        other.len.store(other_state.sequence.len(), Ordering::Release);

        tracing::debug!(
            left = %self.id,
            right = %other.id,
            left_len = own_state.sequence.len(),
            right_len = other_state.sequence.len(),
            "sorted cache storage swapped"
        );
    }

    /// Returns a copy of the stored sequence in ascending order.
    pub fn snapshot(&self) -> Vec<T> {
        self.state.lock().sequence.clone()
    }

    /// Consumes the cache and returns its sorted storage.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sortmru::cache::ConcurrentSortedCache;
    ///
    /// let cache: ConcurrentSortedCache = [3, 1, 2].into_iter().collect();
    /// assert_eq!(cache.into_sorted_vec(), vec![1, 2, 3]);
    /// ```
    pub fn into_sorted_vec(self) -> Vec<T> {
        self.state.into_inner().sequence
    }

    /// Returns the element the recency slot currently points at.
    ///
    /// `None` exactly when the cache is empty.
    pub fn cached_value(&self) -> Option<T> {
        let state = self.state.lock();
        state.slot.resolve(&state.sequence).cloned()
    }
}

impl<T> ConcurrentSortedCache<T> {
    /// Returns the number of stored elements without taking the lock.
    ///
    /// See the type-level "Size Reads" section for what a concurrent
    /// transfer means for this value.
    #[inline]
    pub fn size(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Returns `true` if no elements are stored. Lock-free, like [`size`](Self::size).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns the number of stored elements, read under the guard.
    pub fn synchronized_size(&self) -> usize {
        self.state.lock().sequence.len()
    }

    /// Returns this instance's identity.
    #[inline]
    pub const fn id(&self) -> InstanceId {
        self.id
    }

    /// Returns a copy of this instance's lookup counters.
    pub fn statistics(&self) -> CacheStatistics {
        self.state.lock().statistics
    }
}

impl<T: Ord + Clone> Default for ConcurrentSortedCache<T> {
    fn default() -> Self {
        Self::from_sorted(Vec::new())
    }
}

impl<T: Ord + Clone> From<Vec<T>> for ConcurrentSortedCache<T> {
    fn from(values: Vec<T>) -> Self {
        Self::new(values)
    }
}

impl<T: Ord + Clone> From<&[T]> for ConcurrentSortedCache<T> {
    fn from(values: &[T]) -> Self {
        Self::from_slice(values)
    }
}

impl<T: Ord + Clone> FromIterator<T> for ConcurrentSortedCache<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<T: fmt::Debug> fmt::Debug for ConcurrentSortedCache<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        formatter
            .debug_struct("ConcurrentSortedCache")
            .field("id", &self.id)
            .field("len", &state.sequence.len())
            .field("cached", &state.slot.resolve(&state.sequence))
            .finish_non_exhaustive()
    }
}

impl<T: fmt::Display> fmt::Display for ConcurrentSortedCache<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        write!(formatter, "[")?;
        for (index, element) in state.sequence.iter().enumerate() {
            if index > 0 {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "]")
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for ConcurrentSortedCache<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let state = self.state.lock();
        let mut seq = serializer.serialize_seq(Some(state.sequence.len()))?;
        for element in &state.sequence {
            seq.serialize_element(element)?;
        }
        seq.end()
    }
}

#[cfg(feature = "serde")]
struct ConcurrentSortedCacheVisitor<T> {
    marker: std::marker::PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<T> ConcurrentSortedCacheVisitor<T> {
    const fn new() -> Self {
        Self {
            marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for ConcurrentSortedCacheVisitor<T>
where
    T: serde::Deserialize<'de> + Ord + Clone,
{
    type Value = ConcurrentSortedCache<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        const MAX_PREALLOCATE: usize = 4096;
        let capacity = seq.size_hint().unwrap_or(0).min(MAX_PREALLOCATE);
        let mut elements = Vec::with_capacity(capacity);
        while let Some(element) = seq.next_element()? {
            elements.push(element);
        }
        Ok(ConcurrentSortedCache::new(elements))
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for ConcurrentSortedCache<T>
where
    T: serde::Deserialize<'de> + Ord + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(ConcurrentSortedCacheVisitor::new())
    }
}

// =============================================================================
// Tests
// =============================================================================
