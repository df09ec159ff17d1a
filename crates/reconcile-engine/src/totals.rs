//! Counters accumulated during one reconciliation pass.

/// Size sum and presence counters for one run.
///
/// Only ever incremented. The size sum starts from a caller-supplied seed so
/// totals can be carried across runs by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningTotals {
    /// Bytes accumulated, including the seed.
    pub size_sum: u64,
    /// Objects found absent from the secondary bucket.
    pub missing_count: u64,
    /// Missing objects successfully copied.
    pub copied_count: u64,
}

impl RunningTotals {
    /// Totals whose size sum starts at `previous_sum`.
    #[must_use]
    pub fn seeded(previous_sum: u64) -> Self {
        Self {
            size_sum: previous_sum,
            ..Self::default()
        }
    }

    /// Add an object's size.
    pub fn add_size(&mut self, size: u64) {
        self.size_sum = self.size_sum.saturating_add(size);
    }

    /// Count an object absent from the secondary bucket.
    pub fn record_missing(&mut self) {
        self.missing_count += 1;
    }

    /// Count a successful copy.
    pub fn record_copied(&mut self) {
        self.copied_count += 1;
    }
}
