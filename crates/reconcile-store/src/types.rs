//! Data carried across the storage boundary.

use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};

/// One object as reported by a listing call.
///
/// A snapshot taken at listing time. Stores that omit the timestamp yield the
/// Unix epoch; stores that omit the size yield zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    /// Object key, unique within its bucket.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Last-modified timestamp.
    pub last_modified: DateTime<Utc>,
}

impl ObjectRecord {
    /// Create a new record.
    #[must_use]
    pub fn new(key: impl Into<String>, size: u64, last_modified: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    /// Records in store order.
    pub records: Vec<ObjectRecord>,
    /// Token for the next page; `None` on the last page.
    pub next_token: Option<String>,
}

/// One page of a count-only listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountPage {
    /// Objects on this page.
    pub count: u64,
    /// Token for the next page; `None` on the last page.
    pub next_token: Option<String>,
}

/// Metadata returned by a head request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectHead {
    /// Exact content length in bytes.
    pub size: u64,
    /// Content type, if the store records one.
    pub content_type: Option<String>,
}

/// An object body together with the metadata needed to re-upload it.
#[derive(Debug)]
pub struct ObjectContent {
    /// The body, streamed.
    pub body: ByteStream,
    /// Content type, if the source store reported one.
    pub content_type: Option<String>,
    /// Content length, if known up front.
    pub content_length: Option<u64>,
}
