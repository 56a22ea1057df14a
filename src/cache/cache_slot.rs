//! Single-slot recency cache over a sorted buffer.

/// The position of the most recently found element.
///
/// The slot stores an index, never a reference, so it cannot outlive the
/// buffer it designates. Every read goes through [`CacheSlot::resolve`],
/// which re-checks the index against the buffer it is handed; a stale index
/// resolves to nothing instead of reading out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct CacheSlot {
    position: Option<usize>,
}

impl CacheSlot {
    /// The empty slot.
    pub(crate) const EMPTY: Self = Self { position: None };

    /// A slot on the first element of `sequence`, or empty for an empty buffer.
    #[inline]
    pub(crate) const fn first_of<T>(sequence: &[T]) -> Self {
        if sequence.is_empty() {
            Self::EMPTY
        } else {
            Self { position: Some(0) }
        }
    }

    /// Returns the element the slot designates in `sequence`, if still valid.
    #[inline]
    pub(crate) fn resolve<'a, T>(&self, sequence: &'a [T]) -> Option<&'a T> {
        self.position.and_then(|position| sequence.get(position))
    }

    /// Moves the slot to `position`.
    #[inline]
    pub(crate) const fn reposition(&mut self, position: usize) {
        self.position = Some(position);
    }

    #[cfg(test)]
    pub(crate) const fn position(&self) -> Option<usize> {
        self.position
    }

    #[cfg(test)]
    pub(crate) const fn is_empty(&self) -> bool {
        self.position.is_none()
    }
}
