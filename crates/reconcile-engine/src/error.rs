//! Reconciliation error types.
//!
//! Only [`ReconcileError::StorageUnavailable`] aborts a bucket. The other
//! variants describe per-object or probe failures; the reconciler logs and
//! reports them and carries on.

use reconcile_store::StoreError;

/// Error raised while reconciling a bucket.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Listing or connecting to the primary store failed.
    #[error("storage unavailable for bucket {bucket}: {source}")]
    StorageUnavailable {
        /// Bucket being processed.
        bucket: String,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// An existence check failed for a reason other than "not found".
    #[error("existence check for {key} in {bucket} failed: {source}")]
    TransientStorage {
        /// Secondary bucket.
        bucket: String,
        /// Object key.
        key: String,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// Copying a missing object to the secondary bucket failed.
    #[error("copy of {key} to {bucket} failed: {source}")]
    CopyFailed {
        /// Destination bucket.
        bucket: String,
        /// Object key.
        key: String,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// Fetching the exact size of a primary object failed.
    #[error("size lookup for {key} in {bucket} failed: {source}")]
    SizeLookup {
        /// Primary bucket.
        bucket: String,
        /// Object key.
        key: String,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// The secondary store could not be used; comparison is disabled.
    #[error("cannot connect to secondary bucket {bucket}: {reason}")]
    SecondaryUnreachable {
        /// Secondary bucket (empty when none is configured).
        bucket: String,
        /// Why the probe failed.
        reason: String,
    },
}

impl ReconcileError {
    /// Whether this error aborts the current bucket.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }
}

/// Convenience result type for reconciliation.
pub type ReconcileResult<T> = Result<T, ReconcileError>;
