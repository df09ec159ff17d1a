//! Ordered events describing a reconciliation run.
//!
//! The reconciler emits events strictly in processing order: bucket
//! overview, optional secondary probe result, one [`ObjectLine`] per object
//! in the window, then a single [`Summary`]. A [`Reporter`] decides how to
//! render them; the engine never writes output itself.

use chrono::{DateTime, Utc};

/// Receiver of reconciliation events.
pub trait Reporter {
    /// Handle one event. Called in processing order.
    fn report(&mut self, event: ReportEvent);
}

/// Collects events for later inspection.
impl Reporter for Vec<ReportEvent> {
    fn report(&mut self, event: ReportEvent) {
        self.push(event);
    }
}

/// One step of a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    /// Buckets visible through the primary store.
    Buckets {
        /// Bucket names.
        names: Vec<String>,
    },
    /// Object count of the primary bucket.
    BucketCount {
        /// Primary bucket.
        bucket: String,
        /// Number of objects.
        count: u64,
    },
    /// Object count of the secondary bucket; the probe succeeded.
    SecondaryCount {
        /// Secondary bucket.
        bucket: String,
        /// Number of objects.
        count: u64,
    },
    /// Secondary comparison was requested but is disabled for this run.
    Degraded {
        /// Secondary bucket, empty when none is configured.
        bucket: String,
        /// Why the probe failed.
        reason: String,
    },
    /// The per-object walk is starting.
    ListingStarted {
        /// Primary bucket.
        bucket: String,
    },
    /// A non-fatal failure while handling the object at `index`.
    Issue {
        /// 1-based ordinal of the affected object.
        index: u64,
        /// Description of the failure.
        message: String,
    },
    /// An object in the window was handled.
    Object(ObjectLine),
    /// The window is complete.
    Summary(Summary),
}

/// Per-object report line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLine {
    /// 1-based ordinal in the sorted sequence.
    pub index: u64,
    /// Last-modified timestamp from the listing.
    pub last_modified: DateTime<Utc>,
    /// Object key.
    pub key: String,
    /// Size in bytes, present when size accounting is on.
    pub size: Option<u64>,
    /// Presence in the secondary bucket.
    pub presence: Presence,
}

/// Presence of an object in the secondary bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// No comparison was made.
    Unchecked,
    /// The secondary bucket holds the key.
    Present,
    /// The key is absent (or its existence could not be confirmed).
    Missing,
    /// The key was absent and has been copied.
    Copied,
}

impl Presence {
    /// Human-readable annotation, `None` when there is nothing to flag.
    #[must_use]
    pub fn annotation(&self) -> Option<&'static str> {
        match self {
            Self::Unchecked | Self::Present => None,
            Self::Missing => Some("not in secondary"),
            Self::Copied => Some("not in secondary, copied"),
        }
    }

    /// Whether the object was missing from the secondary bucket.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing | Self::Copied)
    }
}

/// End-of-window summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Accumulated size including the seed, when size accounting is on.
    pub total_size: Option<u64>,
    /// Objects missing from the secondary bucket.
    pub missing: u64,
    /// Missing objects copied.
    pub copied: u64,
    /// Secondary bucket, when comparison ran.
    pub secondary_bucket: Option<String>,
    /// Final state.
    pub status: FinalStatus,
}

/// Outcome of the secondary comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalStatus {
    /// Comparison was not performed.
    Unchecked,
    /// Every object in the window exists in the secondary bucket.
    AllPresent,
    /// Objects are missing and none were copied.
    Missing {
        /// Missing objects.
        missing: u64,
    },
    /// Some or all missing objects were copied.
    Copied {
        /// Objects copied.
        copied: u64,
        /// Objects found missing.
        missing: u64,
    },
}

impl FinalStatus {
    /// Derive the state from the run's counters.
    #[must_use]
    pub fn from_counts(checked: bool, missing: u64, copied: u64) -> Self {
        match (checked, missing, copied) {
            (false, _, _) => Self::Unchecked,
            (true, 0, _) => Self::AllPresent,
            (true, missing, 0) => Self::Missing { missing },
            (true, missing, copied) => Self::Copied { copied, missing },
        }
    }
}
