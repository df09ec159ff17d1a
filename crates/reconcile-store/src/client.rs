//! The storage capability trait.
//!
//! # Object safety
//!
//! The engine holds stores as `Arc<dyn StorageClient>` so the primary and
//! secondary may be different backends, so the trait uses `#[async_trait]`.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::{CountPage, ObjectContent, ObjectHead, ObjectPage};

/// A handle over a bucket-oriented object store.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use reconcile_store::{InMemoryStore, StorageClient};
///
/// # tokio_test::block_on(async {
/// let store: Arc<dyn StorageClient> = Arc::new(InMemoryStore::new());
/// assert!(store.list_buckets().await.unwrap().is_empty());
///
/// let missing = store.head_object("primary", "a.car").await.unwrap_err();
/// assert!(missing.is_not_found());
/// # });
/// ```
#[async_trait]
pub trait StorageClient: Send + Sync + Debug {
    /// Names of all buckets visible to these credentials.
    async fn list_buckets(&self) -> StoreResult<Vec<String>>;

    /// Fetch one listing page, starting after `continuation` when given.
    async fn list_objects_page(
        &self,
        bucket: &str,
        continuation: Option<&str>,
    ) -> StoreResult<ObjectPage>;

    /// Count the objects on one listing page without building records.
    ///
    /// The default implementation counts a full page; backends that can
    /// report a key count directly should override it.
    async fn count_objects_page(
        &self,
        bucket: &str,
        continuation: Option<&str>,
    ) -> StoreResult<CountPage> {
        let page = self.list_objects_page(bucket, continuation).await?;
        Ok(CountPage {
            count: page.records.len() as u64,
            next_token: page.next_token,
        })
    }

    /// Exact size and content type of an object.
    ///
    /// Returns [`StoreError::NotFound`](crate::StoreError::NotFound) when the
    /// key does not exist.
    async fn head_object(&self, bucket: &str, key: &str) -> StoreResult<ObjectHead>;

    /// Open an object's body for streaming.
    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<ObjectContent>;

    /// Upload an object. A `None` content type is omitted from the request.
    async fn put_object(&self, bucket: &str, key: &str, content: ObjectContent) -> StoreResult<()>;
}
