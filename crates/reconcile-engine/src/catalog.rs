//! Complete bucket listings with pagination hidden.

use reconcile_store::{ObjectRecord, StoreError};
use tracing::debug;

use crate::bucket::BucketHandle;
use crate::error::{ReconcileError, ReconcileResult};

/// Lists or counts every object in a bucket.
///
/// Pages are requested until the store stops returning a continuation token.
/// Any failing page fails the whole call; a partial listing is never
/// returned.
#[derive(Debug, Clone, Copy)]
pub struct ObjectCatalog<'a> {
    bucket: &'a BucketHandle,
}

impl<'a> ObjectCatalog<'a> {
    /// Catalog over `bucket`.
    #[must_use]
    pub fn new(bucket: &'a BucketHandle) -> Self {
        Self { bucket }
    }

    /// All records, concatenated in the store's page order.
    pub async fn list(&self) -> ReconcileResult<Vec<ObjectRecord>> {
        let client = self.bucket.client();
        let name = self.bucket.name();
        let mut records = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0_u64;

        loop {
            let page = client
                .list_objects_page(name, token.as_deref())
                .await
                .map_err(|source| self.unavailable(source))?;
            pages += 1;
            records.extend(page.records);
            token = self.advance(token, page.next_token)?;
            if token.is_none() {
                break;
            }
        }

        debug!(bucket = name, pages, objects = records.len(), "listed bucket");
        Ok(records)
    }

    /// Number of objects, without building records.
    pub async fn count(&self) -> ReconcileResult<u64> {
        let client = self.bucket.client();
        let name = self.bucket.name();
        let mut total = 0_u64;
        let mut token: Option<String> = None;

        loop {
            let page = client
                .count_objects_page(name, token.as_deref())
                .await
                .map_err(|source| self.unavailable(source))?;
            total += page.count;
            token = self.advance(token, page.next_token)?;
            if token.is_none() {
                break;
            }
        }

        debug!(bucket = name, objects = total, "counted bucket");
        Ok(total)
    }

    /// Accept the next token unless it repeats the current one.
    fn advance(
        &self,
        current: Option<String>,
        next: Option<String>,
    ) -> ReconcileResult<Option<String>> {
        match next {
            Some(next) if current.as_deref() == Some(next.as_str()) => {
                Err(self.unavailable(StoreError::request(
                    "ListObjectsV2",
                    format!("continuation token {next:?} did not advance"),
                )))
            }
            next => Ok(next),
        }
    }

    fn unavailable(&self, source: StoreError) -> ReconcileError {
        ReconcileError::StorageUnavailable {
            bucket: self.bucket.name().to_owned(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reconcile_store::{FaultPlan, InMemoryStore};

    use super::*;

    fn handle(store: Arc<InMemoryStore>) -> BucketHandle {
        BucketHandle::new("primary", store)
    }

    fn seeded(page_size: usize, count: usize) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::with_page_size(page_size));
        store.create_bucket("primary");
        for i in 0..count {
            store.put("primary", &format!("obj-{i:02}"), vec![0_u8; i], None);
        }
        store
    }

    #[tokio::test]
    async fn test_should_list_across_uneven_pages() {
        let bucket = handle(seeded(3, 7));
        let records = ObjectCatalog::new(&bucket).list().await.expect("list");

        assert_eq!(records.len(), 7);
        let keys: Vec<&str> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys.first(), Some(&"obj-00"));
        assert_eq!(keys.last(), Some(&"obj-06"));
        assert_eq!(records[4].size, 4);
    }

    #[tokio::test]
    async fn test_should_list_empty_bucket() {
        let bucket = handle(seeded(3, 0));
        let records = ObjectCatalog::new(&bucket).list().await.expect("list");
        assert!(records.is_empty());
        assert_eq!(ObjectCatalog::new(&bucket).count().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn test_should_count_across_pages() {
        let bucket = handle(seeded(4, 10));
        let count = ObjectCatalog::new(&bucket).count().await.expect("count");
        assert_eq!(count, 10);
    }

    #[tokio::test]
    async fn test_should_fail_when_first_page_fails() {
        let store = seeded(2, 4);
        store.set_unreachable(true);
        let bucket = handle(store);

        let err = ObjectCatalog::new(&bucket).list().await.unwrap_err();
        assert!(matches!(err, ReconcileError::StorageUnavailable { ref bucket, .. } if bucket == "primary"));
    }

    #[tokio::test]
    async fn test_should_fail_whole_listing_when_later_page_fails() {
        let store = seeded(2, 6);
        store.set_faults(FaultPlan {
            fail_listing_after_pages: Some(2),
            ..FaultPlan::default()
        });
        let bucket = handle(store);

        let err = ObjectCatalog::new(&bucket).list().await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_should_reject_repeated_token() {
        let bucket = handle(seeded(1, 2));
        let catalog = ObjectCatalog::new(&bucket);
        let err = catalog
            .advance(Some("same".to_owned()), Some("same".to_owned()))
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(
            catalog.advance(Some("a".to_owned()), Some("b".to_owned())).expect("advance"),
            Some("b".to_owned())
        );
        assert_eq!(catalog.advance(Some("a".to_owned()), None).expect("advance"), None);
    }
}
