//! Bucket reconciliation engine.
//!
//! Walks a window of a primary bucket's objects in last-modified order,
//! checks each object against a secondary bucket, copies what is missing,
//! and keeps running totals. Every step is reported as a [`ReportEvent`] so
//! output stays in object order.
//!
//! # Architecture
//!
//! ```text
//!   BucketHandle (primary)      BucketHandle (secondary)
//!          |                            |
//!          v                            |
//!    ObjectCatalog (paged listing)      |
//!          |                            |
//!          v                            v
//!     Reconciler ---- head / get / put ----
//!          |
//!          v
//!   Reporter (ordered events)
//! ```

mod bucket;
mod catalog;
mod error;
pub mod reconciler;
pub mod report;
mod size;
mod totals;
mod window;

pub use bucket::BucketHandle;
pub use catalog::ObjectCatalog;
pub use error::{ReconcileError, ReconcileResult};
pub use reconciler::{ReconcileOptions, ReconcileOutcome, Reconciler};
pub use report::{FinalStatus, ObjectLine, Presence, ReportEvent, Reporter, Summary};
pub use size::format_size;
pub use totals::RunningTotals;
pub use window::ReconciliationWindow;

pub use reconcile_store::ObjectRecord;
