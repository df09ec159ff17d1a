//! bucket-reconcile - compare object-storage buckets and copy what is missing.
//!
//! For every enabled network, lists the primary bucket, walks a window of its
//! objects in last-modified order, checks each one against the secondary
//! bucket, and optionally copies missing objects across. The report goes to
//! stdout; logs go to stderr.
//!
//! # Usage
//!
//! ```text
//! MAINNET_ENABLED=true MAINNET_BUCKET_NAME=blocks RECONCILE_SUM_ONLY=false \
//!     bucket-reconcile --config reconcile.json
//! ```
//!
//! # Options
//!
//! | Flag | Description |
//! |------|-------------|
//! | `--config <path>` | JSON configuration file (also `RECONCILE_CONFIG`) |
//! | `--print-config` | Print the effective configuration with secrets masked |
//! | `--version` | Print the version and exit |
//!
//! Every value can be overridden from the environment; see
//! [`reconcile_core::ReconcileConfig`] for the variable names.

mod console;
mod runner;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use reconcile_core::{Network, ReconcileConfig};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::console::ConsoleReporter;

/// Version printed by `--version` and logged at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "RECONCILE_CONFIG";

/// Parsed command line.
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    config: Option<PathBuf>,
    print_config: bool,
    version: bool,
}

fn parse_args<I>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config requires a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--print-config" => parsed.print_config = true,
            "--version" | "-V" => parsed.version = true,
            other => match other.strip_prefix("--config=") {
                Some(path) if !path.is_empty() => parsed.config = Some(PathBuf::from(path)),
                _ => anyhow::bail!("unknown argument: {other}"),
            },
        }
    }
    Ok(parsed)
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    if args.version {
        println!("bucket-reconcile {VERSION}");
        return Ok(());
    }

    let config_path = args
        .config
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    let config =
        ReconcileConfig::load(config_path.as_deref()).context("failed to load configuration")?;

    init_tracing(&config.log_level)?;

    let networks = config.enabled_networks();
    info!(
        version = VERSION,
        config = ?config_path,
        ?networks,
        summary_only = config.summary_only(),
        "starting bucket-reconcile",
    );

    let mut console = ConsoleReporter::new(io::stdout());
    if args.print_config || config.print_config {
        console.config(&config.render_masked());
    }
    if networks.is_empty() {
        warn!("no network enabled; set MAINNET_ENABLED or TESTNET_ENABLED");
    }

    let mut failed = Vec::new();
    for network in networks {
        let reconciler = runner::connect(config.network(network), config.summary_only()).await;
        if runner::run_network(network, &reconciler, &mut console)
            .await
            .is_err()
        {
            failed.push(network);
        }
    }

    console.finish().context("failed to write report")?;

    if !failed.is_empty() {
        error!(?failed, "reconciliation failed");
        let names: Vec<&str> = failed.iter().map(Network::as_str).collect();
        anyhow::bail!("reconciliation failed for: {}", names.join(", "));
    }

    Ok(())
}
