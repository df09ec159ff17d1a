//! Per-network wiring: stores, reconciler, and console section.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use reconcile_core::{Network, NetworkConfig};
use reconcile_engine::{BucketHandle, ReconcileOptions, ReconcileOutcome, Reconciler};
use reconcile_store::S3Store;
use tracing::{error, info};

use crate::console::ConsoleReporter;

/// Build the reconciler for one network from its configuration.
///
/// The secondary store is only connected when comparison is requested.
pub async fn connect(config: &NetworkConfig, summary_only: bool) -> Reconciler {
    let primary = BucketHandle::new(
        config.primary.bucket_name.clone(),
        Arc::new(S3Store::connect(&config.primary).await),
    );

    let secondary = match &config.secondary.store {
        Some(store) if config.secondary.check_secondary => Some(BucketHandle::new(
            store.bucket_name.clone(),
            Arc::new(S3Store::connect(store).await),
        )),
        _ => None,
    };

    Reconciler::new(
        primary,
        secondary,
        ReconcileOptions::from_network(config, summary_only),
    )
}

/// Reconcile one network, writing its console section.
///
/// A failure is printed in the section and returned so the caller can move on
/// to the next network.
pub async fn run_network<W: Write>(
    network: Network,
    reconciler: &Reconciler,
    console: &mut ConsoleReporter<W>,
) -> Result<ReconcileOutcome> {
    console.header(network.title());

    let result = reconciler
        .run(console)
        .await
        .with_context(|| format!("failed to reconcile {network}"));

    match &result {
        Ok(outcome) => info!(
            %network,
            processed = outcome.processed,
            missing = outcome.totals.missing_count,
            copied = outcome.totals.copied_count,
            degraded = outcome.degraded,
            "network done"
        ),
        Err(err) => {
            let message = format!("{err:#}");
            error!(%network, error = %message, "network failed");
            console.failure(err);
        }
    }

    console.end_section();
    result
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use reconcile_engine::ReconciliationWindow;
    use reconcile_store::InMemoryStore;

    use super::*;

    fn stores() -> (Arc<InMemoryStore>, Arc<InMemoryStore>) {
        let primary = Arc::new(InMemoryStore::new());
        for (i, key) in ["a.car", "b.car", "c.car"].iter().enumerate() {
            let secs = 1_700_000_000 + i64::try_from(i).expect("secs");
            let at = DateTime::from_timestamp(secs, 0).expect("timestamp");
            primary.put_at("main", key, "0123456789", Some("application/octet-stream"), at);
        }
        let secondary = Arc::new(InMemoryStore::new());
        secondary.put("backup", "b.car", "0123456789", None);
        (primary, secondary)
    }

    fn render(console: ConsoleReporter<Vec<u8>>) -> String {
        String::from_utf8(console.finish().expect("finish")).expect("utf8")
    }

    #[tokio::test]
    async fn test_should_write_network_section() {
        let (primary, secondary) = stores();
        let reconciler = Reconciler::new(
            BucketHandle::new("main", primary),
            Some(BucketHandle::new("backup", secondary.clone())),
            ReconcileOptions::builder()
                .window(ReconciliationWindow::new(1, 3))
                .with_size(true)
                .check_secondary(true)
                .copy_missing(true)
                .build(),
        );
        let mut console = ConsoleReporter::new(Vec::new());

        let outcome = run_network(Network::Mainnet, &reconciler, &mut console)
            .await
            .expect("run");

        assert_eq!(outcome.totals.copied_count, 2);
        assert_eq!(secondary.object_count("backup"), 3);
        assert_eq!(
            render(console),
            "\n>>>>> Mainnet Processing <<<<<\n\
             Buckets: 1  [main]\n\n\
             main: 3 objects\n\n\
             Compare to  backup: 1 objects\n\n\
             List of Objects in Bucket: main\n\n\
             \x20    1) 2023-11-14 22:13:20 key: a.car  size: 10 [NOT_IN_2] [COPIED]\n\
             \x20    2) 2023-11-14 22:13:21 key: b.car  size: 10\n\
             \x20    3) 2023-11-14 22:13:22 key: c.car  size: 10 [NOT_IN_2] [COPIED]\n\
             \n\
             Total size of listed objects: 30.0 B (30)\n\
             Copied 2 objects to bucket 'backup'\n\
             \n"
        );
    }

    #[tokio::test]
    async fn test_should_report_failed_network_and_return_error() {
        let (primary, _) = stores();
        primary.set_unreachable(true);
        let reconciler = Reconciler::new(
            BucketHandle::new("main", primary),
            None,
            ReconcileOptions::default(),
        );
        let mut console = ConsoleReporter::new(Vec::new());

        let err = run_network(Network::Testnet, &reconciler, &mut console)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("testnet"));
        let out = render(console);
        assert!(out.starts_with("\n>>>>> Testnet Processing <<<<<\nERROR failed to reconcile testnet: "));
        assert!(out.ends_with("\n\n"));
    }
}
