//! S3 store backend integration tests.

#[cfg(test)]
mod tests {
    use reconcile_store::{ObjectContent, StorageClient};

    use crate::{cleanup_bucket, create_test_bucket, put_test_object, s3_client, s3_store};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_page_through_listing() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "paging").await;
        for key in ["a", "b", "c", "d", "e"] {
            put_test_object(&client, &bucket, key, b"x", None).await;
        }
        let store = s3_store(2);

        let first = store.list_objects_page(&bucket, None).await.expect("page 1");
        assert_eq!(first.records.len(), 2);
        let token = first.next_token.expect("continuation token");

        let second = store
            .list_objects_page(&bucket, Some(&token))
            .await
            .expect("page 2");
        assert_eq!(second.records[0].key, "c");

        let count = store.count_objects_page(&bucket, None).await.expect("count");
        assert_eq!(count.count, 2);
        assert!(count.next_token.is_some());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_map_missing_object_to_not_found() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "notfound").await;
        let store = s3_store(100);

        let head = store.head_object(&bucket, "missing").await.unwrap_err();
        assert!(head.is_not_found());
        let get = store.get_object(&bucket, "missing").await.unwrap_err();
        assert!(get.is_not_found());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_stream_object_between_buckets() {
        let client = s3_client();
        let source = create_test_bucket(&client, "src").await;
        let dest = create_test_bucket(&client, "dst").await;
        put_test_object(&client, &source, "doc.json", b"{\"a\":1}", Some("application/json")).await;
        let store = s3_store(100);

        let content: ObjectContent = store.get_object(&source, "doc.json").await.expect("get");
        assert_eq!(content.content_length, Some(7));
        store.put_object(&dest, "doc.json", content).await.expect("put");

        let head = store.head_object(&dest, "doc.json").await.expect("head");
        assert_eq!(head.size, 7);
        assert_eq!(head.content_type.as_deref(), Some("application/json"));

        cleanup_bucket(&client, &source).await;
        cleanup_bucket(&client, &dest).await;
    }
}
