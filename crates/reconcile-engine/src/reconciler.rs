//! The reconciliation pass over one primary bucket.
//!
//! A pass lists the primary bucket, sorts it by last-modified time, and walks
//! the configured window one object at a time. Each object is fully handled
//! (size lookup, presence check, optional copy) and reported before the next
//! one starts, so report order always matches sorted order.

use reconcile_core::NetworkConfig;
use reconcile_store::{ObjectRecord, StoreError};
use tracing::{debug, error, info, warn};
use typed_builder::TypedBuilder;

use crate::bucket::BucketHandle;
use crate::catalog::ObjectCatalog;
use crate::error::{ReconcileError, ReconcileResult};
use crate::report::{FinalStatus, ObjectLine, Presence, ReportEvent, Reporter, Summary};
use crate::totals::RunningTotals;
use crate::window::ReconciliationWindow;

/// Knobs for one reconciliation pass.
#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct ReconcileOptions {
    /// Ordinal window of sorted objects to walk.
    #[builder(default)]
    pub window: ReconciliationWindow,
    /// Look up exact sizes and accumulate them.
    #[builder(default)]
    pub with_size: bool,
    /// Stop after the bucket overview; walk no objects.
    #[builder(default)]
    pub summary_only: bool,
    /// Compare each object against the secondary bucket.
    #[builder(default)]
    pub check_secondary: bool,
    /// Copy objects missing from the secondary bucket.
    #[builder(default)]
    pub copy_missing: bool,
    /// Seed for the running size sum.
    #[builder(default)]
    pub previous_sum: u64,
}

impl ReconcileOptions {
    /// Options for a configured network.
    #[must_use]
    pub fn from_network(config: &NetworkConfig, summary_only: bool) -> Self {
        Self {
            window: ReconciliationWindow::new(config.first, config.last),
            with_size: config.with_size,
            summary_only,
            check_secondary: config.secondary.check_secondary,
            copy_missing: config.secondary.copy_missing,
            previous_sum: config.prev_sum,
        }
    }
}

/// Result of a completed pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Final counters.
    pub totals: RunningTotals,
    /// Objects walked.
    pub processed: u64,
    /// Secondary comparison was requested but disabled.
    pub degraded: bool,
    /// Objects were compared against the secondary bucket.
    pub checked: bool,
    /// The pass stopped after the bucket overview.
    pub summary_only: bool,
}

/// Reconciles a primary bucket against an optional secondary bucket.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use reconcile_engine::{BucketHandle, ReconcileOptions, Reconciler, ReportEvent};
/// use reconcile_store::InMemoryStore;
///
/// # tokio_test::block_on(async {
/// let store = Arc::new(InMemoryStore::new());
/// store.put("primary", "a.car", "data", None);
///
/// let primary = BucketHandle::new("primary", store);
/// let reconciler = Reconciler::new(primary, None, ReconcileOptions::default());
/// let mut events: Vec<ReportEvent> = Vec::new();
/// let outcome = reconciler.run(&mut events).await.unwrap();
/// assert_eq!(outcome.processed, 1);
/// # });
/// ```
#[derive(Debug)]
pub struct Reconciler {
    primary: BucketHandle,
    secondary: Option<BucketHandle>,
    options: ReconcileOptions,
}

impl Reconciler {
    /// Create a reconciler.
    ///
    /// Without a `secondary` bucket, a requested comparison runs degraded.
    #[must_use]
    pub fn new(
        primary: BucketHandle,
        secondary: Option<BucketHandle>,
        options: ReconcileOptions,
    ) -> Self {
        Self {
            primary,
            secondary,
            options,
        }
    }

    /// The options in effect.
    #[must_use]
    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Run one pass, emitting events to `reporter` in processing order.
    ///
    /// Only failing to list or count the primary bucket is an error; every
    /// per-object failure is reported and the walk continues.
    pub async fn run(&self, reporter: &mut dyn Reporter) -> ReconcileResult<ReconcileOutcome> {
        let bucket = self.primary.name();
        info!(bucket, "reconciling bucket");

        let names = self
            .primary
            .client()
            .list_buckets()
            .await
            .map_err(|source| {
                let err = ReconcileError::StorageUnavailable {
                    bucket: bucket.to_owned(),
                    source,
                };
                error!(error = %err, "failed to list buckets");
                err
            })?;
        reporter.report(ReportEvent::Buckets { names });

        let count = ObjectCatalog::new(&self.primary).count().await?;
        reporter.report(ReportEvent::BucketCount {
            bucket: bucket.to_owned(),
            count,
        });

        let secondary = self.probe_secondary(reporter).await;
        let degraded = self.options.check_secondary && secondary.is_none();
        let copy_missing = self.options.copy_missing && secondary.is_some();

        let mut totals = RunningTotals::seeded(self.options.previous_sum);
        let mut outcome = ReconcileOutcome {
            totals,
            processed: 0,
            degraded,
            checked: secondary.is_some(),
            summary_only: self.options.summary_only,
        };
        if self.options.summary_only {
            debug!(bucket, "summary only, skipping object walk");
            return Ok(outcome);
        }

        let mut records = ObjectCatalog::new(&self.primary).list().await?;
        // Stable: equal timestamps keep listing order.
        records.sort_by_key(|record| record.last_modified);
        reporter.report(ReportEvent::ListingStarted {
            bucket: bucket.to_owned(),
        });

        let range = self.options.window.range(records.len());
        let start = range.start;
        for (offset, record) in records[range].iter().enumerate() {
            let index = ordinal(start + offset);
            self.process(index, record, secondary, copy_missing, &mut totals, reporter)
                .await;
            outcome.processed += 1;
        }

        let status = FinalStatus::from_counts(
            secondary.is_some(),
            totals.missing_count,
            totals.copied_count,
        );
        info!(
            bucket,
            processed = outcome.processed,
            missing = totals.missing_count,
            copied = totals.copied_count,
            size_sum = totals.size_sum,
            "reconciliation finished"
        );
        reporter.report(ReportEvent::Summary(Summary {
            total_size: self.options.with_size.then_some(totals.size_sum),
            missing: totals.missing_count,
            copied: totals.copied_count,
            secondary_bucket: secondary.map(|s| s.name().to_owned()),
            status,
        }));

        outcome.totals = totals;
        Ok(outcome)
    }

    /// Verify the secondary bucket is usable, reporting its object count.
    ///
    /// Returns `None` when no comparison should happen. A failed probe is
    /// reported once as [`ReportEvent::Degraded`].
    async fn probe_secondary(&self, reporter: &mut dyn Reporter) -> Option<&BucketHandle> {
        if !self.options.check_secondary {
            return None;
        }

        let result = match &self.secondary {
            None => Err(ReconcileError::SecondaryUnreachable {
                bucket: String::new(),
                reason: "no secondary store configured".to_owned(),
            }),
            Some(secondary) => Self::probe(secondary).await.map(|count| (secondary, count)),
        };

        match result {
            Ok((secondary, count)) => {
                reporter.report(ReportEvent::SecondaryCount {
                    bucket: secondary.name().to_owned(),
                    count,
                });
                Some(secondary)
            }
            Err(err) => {
                warn!(error = %err, "secondary comparison disabled");
                let (bucket, reason) = match err {
                    ReconcileError::SecondaryUnreachable { bucket, reason } => (bucket, reason),
                    other => (String::new(), other.to_string()),
                };
                reporter.report(ReportEvent::Degraded { bucket, reason });
                None
            }
        }
    }

    async fn probe(secondary: &BucketHandle) -> ReconcileResult<u64> {
        let unusable = |reason: String| ReconcileError::SecondaryUnreachable {
            bucket: secondary.name().to_owned(),
            reason,
        };
        secondary
            .client()
            .list_buckets()
            .await
            .map_err(|e| unusable(e.to_string()))?;
        ObjectCatalog::new(secondary)
            .count()
            .await
            .map_err(|e| match e {
                ReconcileError::StorageUnavailable { source, .. } => unusable(source.to_string()),
                other => unusable(other.to_string()),
            })
    }

    async fn process(
        &self,
        index: u64,
        record: &ObjectRecord,
        secondary: Option<&BucketHandle>,
        copy_missing: bool,
        totals: &mut RunningTotals,
        reporter: &mut dyn Reporter,
    ) {
        let size = if self.options.with_size {
            Some(self.object_size(index, record, reporter).await)
        } else {
            None
        };

        let presence = match secondary {
            Some(secondary) => {
                self.check_presence(index, record, secondary, copy_missing, totals, reporter)
                    .await
            }
            None => Presence::Unchecked,
        };

        debug!(index, key = %record.key, ?presence, "processed object");
        reporter.report(ReportEvent::Object(ObjectLine {
            index,
            last_modified: record.last_modified,
            key: record.key.clone(),
            size,
            presence,
        }));

        if let Some(size) = size {
            totals.add_size(size);
        }
    }

    /// Exact size from the primary store, falling back to the listed size.
    async fn object_size(
        &self,
        index: u64,
        record: &ObjectRecord,
        reporter: &mut dyn Reporter,
    ) -> u64 {
        match self
            .primary
            .client()
            .head_object(self.primary.name(), &record.key)
            .await
        {
            Ok(head) => head.size,
            Err(source) => {
                let err = ReconcileError::SizeLookup {
                    bucket: self.primary.name().to_owned(),
                    key: record.key.clone(),
                    source,
                };
                warn!(error = %err, "using listed size");
                report_issue(reporter, index, &err);
                record.size
            }
        }
    }

    async fn check_presence(
        &self,
        index: u64,
        record: &ObjectRecord,
        secondary: &BucketHandle,
        copy_missing: bool,
        totals: &mut RunningTotals,
        reporter: &mut dyn Reporter,
    ) -> Presence {
        match secondary
            .client()
            .head_object(secondary.name(), &record.key)
            .await
        {
            Ok(_) => return Presence::Present,
            Err(e) if e.is_not_found() => {}
            Err(source) => {
                // Unknown existence counts as missing.
                let err = ReconcileError::TransientStorage {
                    bucket: secondary.name().to_owned(),
                    key: record.key.clone(),
                    source,
                };
                warn!(error = %err, "existence check failed");
                report_issue(reporter, index, &err);
            }
        }

        totals.record_missing();
        if !copy_missing {
            return Presence::Missing;
        }

        match self.copy_object(secondary, &record.key).await {
            Ok(()) => {
                totals.record_copied();
                Presence::Copied
            }
            Err(source) => {
                let err = ReconcileError::CopyFailed {
                    bucket: secondary.name().to_owned(),
                    key: record.key.clone(),
                    source,
                };
                warn!(error = %err, "copy failed");
                report_issue(reporter, index, &err);
                Presence::Missing
            }
        }
    }

    /// Stream an object from the primary bucket into `secondary`.
    async fn copy_object(&self, secondary: &BucketHandle, key: &str) -> Result<(), StoreError> {
        let content = self
            .primary
            .client()
            .get_object(self.primary.name(), key)
            .await?;
        secondary
            .client()
            .put_object(secondary.name(), key, content)
            .await?;
        info!(
            key,
            from = self.primary.name(),
            to = secondary.name(),
            "copied object"
        );
        Ok(())
    }
}

fn report_issue(reporter: &mut dyn Reporter, index: u64, err: &ReconcileError) {
    reporter.report(ReportEvent::Issue {
        index,
        message: err.to_string(),
    });
}

/// 1-based ordinal of a zero-based position.
fn ordinal(position: usize) -> u64 {
    u64::try_from(position).unwrap_or(u64::MAX).saturating_add(1)
}
