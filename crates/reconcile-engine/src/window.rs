//! 1-based inclusive window over a sorted object sequence.

use std::ops::Range;

/// Ordinal positions `[first, last]` (1-based, inclusive) to process.
///
/// A `first` of zero is read as one. Bounds past the end of the sequence are
/// clamped, and `last < first` selects nothing; neither case is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationWindow {
    first: u64,
    last: u64,
}

impl ReconciliationWindow {
    /// Window covering ordinals `first..=last`.
    #[must_use]
    pub fn new(first: u64, last: u64) -> Self {
        Self { first, last }
    }

    /// Window covering a whole sequence.
    #[must_use]
    pub fn all() -> Self {
        Self::new(1, u64::MAX)
    }

    /// First ordinal, with zero normalised to one.
    #[must_use]
    pub fn first(&self) -> u64 {
        self.first.max(1)
    }

    /// Last ordinal as configured.
    #[must_use]
    pub fn last(&self) -> u64 {
        self.last
    }

    /// Zero-based index range selected from a sequence of `len` items.
    ///
    /// The ordinal of the item at zero-based position `i` is `i + 1`.
    #[must_use]
    pub fn range(&self, len: usize) -> Range<usize> {
        let start = clamp_to_len(self.first() - 1, len);
        let end = clamp_to_len(self.last, len);
        if start >= end { 0..0 } else { start..end }
    }
}

impl Default for ReconciliationWindow {
    fn default() -> Self {
        Self::all()
    }
}

fn clamp_to_len(value: u64, len: usize) -> usize {
    usize::try_from(value).map_or(len, |v| v.min(len))
}
