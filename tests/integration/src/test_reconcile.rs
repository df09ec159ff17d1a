//! End-to-end reconciliation between two live buckets.

#[cfg(test)]
mod tests {
    use reconcile_engine::{
        FinalStatus, Presence, ReconcileOptions, ReconciliationWindow, Reconciler, ReportEvent,
    };

    use crate::{bucket_handle, cleanup_bucket, create_test_bucket, put_test_object, s3_client};

    fn presences(events: &[ReportEvent]) -> Vec<(String, Presence)> {
        events
            .iter()
            .filter_map(|e| match e {
                ReportEvent::Object(line) => Some((line.key.clone(), line.presence)),
                _ => None,
            })
            .collect()
    }

    fn status(events: &[ReportEvent]) -> Option<FinalStatus> {
        events.iter().find_map(|e| match e {
            ReportEvent::Summary(summary) => Some(summary.status),
            _ => None,
        })
    }

    fn copy_options() -> ReconcileOptions {
        ReconcileOptions::builder()
            .window(ReconciliationWindow::all())
            .with_size(true)
            .check_secondary(true)
            .copy_missing(true)
            .build()
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_copy_missing_objects_then_report_all_present() {
        let client = s3_client();
        let primary = create_test_bucket(&client, "primary").await;
        let secondary = create_test_bucket(&client, "secondary").await;
        for key in ["1.car", "2.car", "3.car"] {
            put_test_object(&client, &primary, key, b"block", Some("application/vnd.ipld.car")).await;
        }
        put_test_object(&client, &secondary, "2.car", b"block", None).await;

        let reconciler = Reconciler::new(
            bucket_handle(&primary, 2),
            Some(bucket_handle(&secondary, 2)),
            copy_options(),
        );

        let mut first = Vec::new();
        let outcome = reconciler.run(&mut first).await.expect("first run");
        assert_eq!(outcome.totals.missing_count, 2);
        assert_eq!(outcome.totals.copied_count, 2);
        assert_eq!(outcome.totals.size_sum, 15);
        assert_eq!(
            presences(&first)
                .iter()
                .filter(|(_, p)| *p == Presence::Copied)
                .count(),
            2
        );

        let copied = client
            .head_object()
            .bucket(&secondary)
            .key("1.car")
            .send()
            .await
            .expect("head copied object");
        assert_eq!(copied.content_type(), Some("application/vnd.ipld.car"));

        let mut second = Vec::new();
        let outcome = reconciler.run(&mut second).await.expect("second run");
        assert_eq!(outcome.totals.missing_count, 0);
        assert_eq!(status(&second), Some(FinalStatus::AllPresent));

        cleanup_bucket(&client, &primary).await;
        cleanup_bucket(&client, &secondary).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_degrade_when_secondary_bucket_missing() {
        let client = s3_client();
        let primary = create_test_bucket(&client, "primary").await;
        put_test_object(&client, &primary, "only.car", b"x", None).await;
        let missing = crate::test_bucket_name("absent");

        let reconciler = Reconciler::new(
            bucket_handle(&primary, 100),
            Some(bucket_handle(&missing, 100)),
            copy_options(),
        );
        let mut events = Vec::new();
        let outcome = reconciler.run(&mut events).await.expect("run");

        assert!(outcome.degraded);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, ReportEvent::Degraded { .. }))
                .count(),
            1
        );
        assert_eq!(
            presences(&events),
            vec![("only.car".to_owned(), Presence::Unchecked)]
        );

        cleanup_bucket(&client, &primary).await;
    }
}
