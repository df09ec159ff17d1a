//! In-memory object store.
//!
//! Buckets live in a [`DashMap`] keyed by name; each bucket keeps its objects
//! in a [`BTreeMap`] so listings come back in lexicographic key order, as
//! they do from S3. Listing pages are capped at a configurable size and
//! continued with base64-encoded "start after" tokens.
//!
//! A [`FaultPlan`] makes individual operations fail on demand so the error
//! paths of callers can be exercised without a network.

use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use base64::Engine as _;
use base64::prelude::BASE64_STANDARD;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::client::StorageClient;
use crate::error::{StoreError, StoreResult};
use crate::types::{CountPage, ObjectContent, ObjectHead, ObjectPage, ObjectRecord};

/// Default listing page size, matching S3's `MaxKeys` default.
const DEFAULT_PAGE_SIZE: usize = 1000;

/// An object held by [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object body.
    pub data: Bytes,
    /// Content type, if set on upload.
    pub content_type: Option<String>,
    /// Last-modified timestamp.
    pub last_modified: DateTime<Utc>,
}

/// Failures to inject into an [`InMemoryStore`].
#[derive(Debug, Default, Clone)]
pub struct FaultPlan {
    /// Every operation fails as if the endpoint were down.
    pub unreachable: bool,
    /// Listing pages (objects and counts) fail once this many have been served.
    pub fail_listing_after_pages: Option<usize>,
    /// Keys whose head requests fail with a non-404 error.
    pub failing_heads: HashSet<String>,
    /// Keys whose body downloads fail.
    pub failing_gets: HashSet<String>,
    /// Keys whose uploads fail.
    pub failing_puts: HashSet<String>,
    /// Keys whose listing entries omit the timestamp and size.
    pub sparse_listing_keys: HashSet<String>,
}

/// A thread-safe, process-local object store.
///
/// # Examples
///
/// ```
/// use reconcile_store::InMemoryStore;
///
/// let store = InMemoryStore::new();
/// store.create_bucket("primary");
/// store.put("primary", "a.txt", "hello", Some("text/plain"));
/// assert!(store.contains("primary", "a.txt"));
/// ```
#[derive(Debug)]
pub struct InMemoryStore {
    buckets: DashMap<String, BTreeMap<String, StoredObject>>,
    page_size: usize,
    faults: Mutex<FaultState>,
}

#[derive(Debug, Default)]
struct FaultState {
    plan: FaultPlan,
    pages_served: usize,
}

impl InMemoryStore {
    /// Create an empty store with the default page size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Create an empty store that serves at most `page_size` objects per page.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            buckets: DashMap::new(),
            page_size: page_size.max(1),
            faults: Mutex::new(FaultState::default()),
        }
    }

    /// Create a bucket if it does not exist yet.
    pub fn create_bucket(&self, bucket: &str) {
        self.buckets.entry(bucket.to_owned()).or_default();
    }

    /// Store an object stamped with the current time.
    pub fn put(
        &self,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
        content_type: Option<&str>,
    ) {
        self.put_at(bucket, key, data, content_type, Utc::now());
    }

    /// Store an object with an explicit last-modified timestamp.
    ///
    /// Creates the bucket when needed.
    pub fn put_at(
        &self,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
        content_type: Option<&str>,
        last_modified: DateTime<Utc>,
    ) {
        let object = StoredObject {
            data: data.into(),
            content_type: content_type.map(ToOwned::to_owned),
            last_modified,
        };
        self.buckets
            .entry(bucket.to_owned())
            .or_default()
            .insert(key.to_owned(), object);
    }

    /// Whether the object exists.
    #[must_use]
    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.buckets
            .get(bucket)
            .is_some_and(|objects| objects.contains_key(key))
    }

    /// A copy of the stored object.
    #[must_use]
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.buckets
            .get(bucket)
            .and_then(|objects| objects.get(key).cloned())
    }

    /// Number of objects in the bucket (zero when it does not exist).
    #[must_use]
    pub fn object_count(&self, bucket: &str) -> usize {
        self.buckets.get(bucket).map_or(0, |objects| objects.len())
    }

    /// Replace the fault plan and reset the listing page counter.
    pub fn set_faults(&self, plan: FaultPlan) {
        *self.faults.lock() = FaultState {
            plan,
            pages_served: 0,
        };
    }

    /// Mark the whole store as (un)reachable.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.faults.lock().plan.unreachable = unreachable;
    }

    fn check_reachable(&self, operation: &'static str) -> StoreResult<()> {
        if self.faults.lock().plan.unreachable {
            return Err(StoreError::request(operation, "connection refused"));
        }
        Ok(())
    }

    fn check_key_fault(
        &self,
        operation: &'static str,
        key: &str,
        select: fn(&FaultPlan) -> &HashSet<String>,
    ) -> StoreResult<()> {
        let faults = self.faults.lock();
        if faults.plan.unreachable {
            return Err(StoreError::request(operation, "connection refused"));
        }
        if select(&faults.plan).contains(key) {
            return Err(StoreError::request(
                operation,
                format!("injected failure for {key}"),
            ));
        }
        Ok(())
    }

    fn take_listing_page(&self, operation: &'static str) -> StoreResult<()> {
        let mut faults = self.faults.lock();
        if faults.plan.unreachable {
            return Err(StoreError::request(operation, "connection refused"));
        }
        if let Some(limit) = faults.plan.fail_listing_after_pages {
            if faults.pages_served >= limit {
                return Err(StoreError::request(operation, "listing interrupted"));
            }
        }
        faults.pages_served += 1;
        Ok(())
    }

    /// Keys and records of one page, plus the token for the next page.
    fn page(
        &self,
        bucket: &str,
        continuation: Option<&str>,
    ) -> StoreResult<(Vec<ObjectRecord>, Option<String>)> {
        let start_after = continuation.map(decode_token).transpose()?;
        let objects = self
            .buckets
            .get(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket {
                bucket: bucket.to_owned(),
            })?;
        let sparse = self.faults.lock().plan.sparse_listing_keys.clone();

        let lower = match &start_after {
            Some(key) => Bound::Excluded(key.clone()),
            None => Bound::Unbounded,
        };
        let mut iter = objects.range((lower, Bound::Unbounded));
        let records: Vec<ObjectRecord> = iter
            .by_ref()
            .take(self.page_size)
            .map(|(key, object)| {
                if sparse.contains(key) {
                    ObjectRecord::new(key.clone(), 0, DateTime::<Utc>::UNIX_EPOCH)
                } else {
                    ObjectRecord::new(key.clone(), object.data.len() as u64, object.last_modified)
                }
            })
            .collect();

        let next_token = match (iter.next(), records.last()) {
            (Some(_), Some(last)) => Some(encode_token(&last.key)),
            _ => None,
        };
        Ok((records, next_token))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageClient for InMemoryStore {
    async fn list_buckets(&self) -> StoreResult<Vec<String>> {
        self.check_reachable("ListBuckets")?;
        let mut names: Vec<String> = self.buckets.iter().map(|e| e.key().clone()).collect();
        names.sort();
        Ok(names)
    }

    async fn list_objects_page(
        &self,
        bucket: &str,
        continuation: Option<&str>,
    ) -> StoreResult<ObjectPage> {
        self.take_listing_page("ListObjectsV2")?;
        let (records, next_token) = self.page(bucket, continuation)?;
        trace!(bucket, count = records.len(), "served listing page");
        Ok(ObjectPage {
            records,
            next_token,
        })
    }

    async fn count_objects_page(
        &self,
        bucket: &str,
        continuation: Option<&str>,
    ) -> StoreResult<CountPage> {
        self.take_listing_page("ListObjectsV2")?;
        let (records, next_token) = self.page(bucket, continuation)?;
        Ok(CountPage {
            count: records.len() as u64,
            next_token,
        })
    }

    async fn head_object(&self, bucket: &str, key: &str) -> StoreResult<ObjectHead> {
        self.check_key_fault("HeadObject", key, |plan| &plan.failing_heads)?;
        let object = self.object(bucket, key).ok_or_else(|| StoreError::NotFound {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        })?;
        Ok(ObjectHead {
            size: object.data.len() as u64,
            content_type: object.content_type,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<ObjectContent> {
        self.check_key_fault("GetObject", key, |plan| &plan.failing_gets)?;
        let object = self.object(bucket, key).ok_or_else(|| StoreError::NotFound {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        })?;
        Ok(ObjectContent {
            content_length: Some(object.data.len() as u64),
            content_type: object.content_type,
            body: ByteStream::from(object.data),
        })
    }

    async fn put_object(&self, bucket: &str, key: &str, content: ObjectContent) -> StoreResult<()> {
        self.check_key_fault("PutObject", key, |plan| &plan.failing_puts)?;
        if !self.buckets.contains_key(bucket) {
            return Err(StoreError::NoSuchBucket {
                bucket: bucket.to_owned(),
            });
        }

        let data = content
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Body {
                key: key.to_owned(),
                message: e.to_string(),
            })?
            .into_bytes();

        debug!(bucket, key, size = data.len(), "stored object");
        self.put(bucket, key, data, content.content_type.as_deref());
        Ok(())
    }
}

fn encode_token(key: &str) -> String {
    BASE64_STANDARD.encode(key.as_bytes())
}

fn decode_token(token: &str) -> StoreResult<String> {
    let invalid = || StoreError::InvalidToken {
        token: token.to_owned(),
    };
    let bytes = BASE64_STANDARD.decode(token).map_err(|_| invalid())?;
    String::from_utf8(bytes).map_err(|_| invalid())
}
