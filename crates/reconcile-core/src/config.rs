//! Configuration for reconciliation runs.
//!
//! A run covers up to two [`Network`]s. Each network names a primary store,
//! an optional secondary store, the window of sorted objects to walk, and the
//! accounting flags. Values come from an optional JSON file and are then
//! overridden by environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Default |
//! |----------|---------|
//! | `LOG_LEVEL` | `info` |
//! | `RECONCILE_SUM_ONLY` | `true` |
//! | `RECONCILE_PRINT_CONFIG` | `false` |
//! | `MAINNET_ENABLED` / `TESTNET_ENABLED` | `false` |
//! | `{NET}_ENDPOINT_URL` | *(unset)* |
//! | `{NET}_REGION` | `auto` |
//! | `{NET}_ACCESS_KEY_ID` / `{NET}_SECRET_ACCESS_KEY` | *(unset)* |
//! | `{NET}_BUCKET_NAME` | *(unset)* |
//! | `{NET}_PAGE_SIZE` / `{NET}_MAX_ATTEMPTS` | store default / `3` |
//! | `{NET}_FIRST` / `{NET}_LAST` / `{NET}_PREV_SUM` | `0` |
//! | `{NET}_WITH_SIZE` | `false` |
//! | `{NET}2_CHECK_SECONDARY` / `{NET}2_COPY_MISSING` | `false` |
//!
//! `{NET}` is `MAINNET` or `TESTNET`; the `{NET}2_` prefix accepts the same
//! store variables for the secondary bucket.

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Network, mask_secret};

/// Field-name fragments whose values are masked when printing.
const SENSITIVE_FRAGMENTS: [&str; 4] = ["key", "secret", "password", "token"];

/// Connection settings for one bucket-oriented object store.
///
/// # Examples
///
/// ```
/// use reconcile_core::StoreConfig;
///
/// let store = StoreConfig::builder()
///     .bucket_name("blocks".into())
///     .endpoint_url("https://example.r2.cloudflarestorage.com".into())
///     .build();
/// assert_eq!(store.region, "auto");
/// assert_eq!(store.max_attempts, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Custom endpoint URL (R2, MinIO, a local emulator). `None` uses AWS.
    #[builder(default, setter(strip_option))]
    pub endpoint_url: Option<String>,

    /// Signing region. R2 accepts `auto`.
    #[builder(default = String::from("auto"))]
    pub region: String,

    /// Static access key ID. When absent the default credential chain is used.
    #[builder(default, setter(strip_option))]
    pub access_key_id: Option<String>,

    /// Static secret access key.
    #[builder(default, setter(strip_option))]
    pub secret_access_key: Option<String>,

    /// Bucket to operate on.
    #[builder(default)]
    pub bucket_name: String,

    /// Maximum keys requested per listing page; the store default when unset.
    #[builder(default, setter(strip_option))]
    pub page_size: Option<i32>,

    /// Maximum attempts per request, including the first.
    #[builder(default = 3)]
    pub max_attempts: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            region: String::from("auto"),
            access_key_id: None,
            secret_access_key: None,
            bucket_name: String::new(),
            page_size: None,
            max_attempts: 3,
        }
    }
}

/// Settings for the secondary (comparison and replication target) store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase", default)]
pub struct SecondaryConfig {
    /// Check each primary object for presence in the secondary bucket.
    #[builder(default)]
    pub check_secondary: bool,

    /// Copy objects missing from the secondary bucket.
    #[builder(default)]
    pub copy_missing: bool,

    /// The secondary store, if configured.
    #[builder(default, setter(strip_option))]
    pub store: Option<StoreConfig>,
}

/// Settings for one network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkConfig {
    /// Whether this network is processed.
    #[builder(default)]
    pub enabled: bool,

    /// The primary store whose objects are enumerated.
    #[builder(default)]
    pub primary: StoreConfig,

    /// First 1-based ordinal of the window over the sorted objects.
    #[builder(default)]
    pub first: u64,

    /// Last 1-based ordinal (inclusive) of the window.
    #[builder(default)]
    pub last: u64,

    /// Fetch exact sizes and accumulate the running sum.
    #[builder(default)]
    pub with_size: bool,

    /// Running sum carried over from a previous run.
    #[builder(default)]
    pub prev_sum: u64,

    /// Secondary store and comparison flags.
    #[builder(default)]
    pub secondary: SecondaryConfig,
}

/// Top-level configuration for one run.
///
/// # Examples
///
/// ```
/// use reconcile_core::ReconcileConfig;
///
/// let config = ReconcileConfig::default();
/// assert!(config.sum_only);
/// assert!(config.enabled_networks().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconcileConfig {
    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Only print bucket summaries; do not walk objects.
    #[builder(default = true)]
    pub sum_only: bool,

    /// Print the effective configuration (secrets masked) before running.
    #[builder(default)]
    pub print_config: bool,

    /// Mainnet settings.
    #[builder(default)]
    pub mainnet: NetworkConfig,

    /// Testnet settings.
    #[builder(default)]
    pub testnet: NetworkConfig,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            log_level: String::from("info"),
            sum_only: true,
            print_config: false,
            mainnet: NetworkConfig::default(),
            testnet: NetworkConfig::default(),
        }
    }
}

impl ReconcileConfig {
    /// Load configuration from environment variables on top of defaults.
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the file (if any), apply environment overrides, and validate.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => {
                debug!(path = %path.display(), "loading config file");
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override values from the process environment.
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Override values from an arbitrary variable lookup.
    pub fn apply_vars<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = lookup("RECONCILE_SUM_ONLY") {
            self.sum_only = parse_bool(&v);
        }
        if let Some(v) = lookup("RECONCILE_PRINT_CONFIG") {
            self.print_config = parse_bool(&v);
        }
        for network in Network::ALL {
            self.network_mut(network).apply_vars(network, &lookup)?;
        }
        Ok(())
    }

    /// Check that every enabled network can be run.
    pub fn validate(&self) -> ConfigResult<()> {
        for network in self.enabled_networks() {
            let config = self.network(network);
            if config.primary.bucket_name.is_empty() {
                return Err(ConfigError::Missing {
                    field: format!("{}_BUCKET_NAME", network.env_prefix()),
                });
            }
            if let Some(store) = &config.secondary.store {
                if config.secondary.check_secondary && store.bucket_name.is_empty() {
                    return Err(ConfigError::Missing {
                        field: format!("{}_BUCKET_NAME", network.secondary_env_prefix()),
                    });
                }
            }
        }
        Ok(())
    }

    /// Settings for the given network.
    #[must_use]
    pub fn network(&self, network: Network) -> &NetworkConfig {
        match network {
            Network::Mainnet => &self.mainnet,
            Network::Testnet => &self.testnet,
        }
    }

    fn network_mut(&mut self, network: Network) -> &mut NetworkConfig {
        match network {
            Network::Mainnet => &mut self.mainnet,
            Network::Testnet => &mut self.testnet,
        }
    }

    /// Networks enabled for this run, in processing order.
    #[must_use]
    pub fn enabled_networks(&self) -> Vec<Network> {
        Network::ALL
            .into_iter()
            .filter(|n| self.network(*n).enabled)
            .collect()
    }

    /// Whether object walks are skipped in favour of bucket summaries.
    ///
    /// True when `sum_only` is set or when both networks run together.
    #[must_use]
    pub fn summary_only(&self) -> bool {
        self.sum_only || (self.mainnet.enabled && self.testnet.enabled)
    }

    /// Render the configuration as INI-like sections with secrets masked.
    #[must_use]
    pub fn render_masked(&self) -> String {
        let mut out = String::new();
        let Ok(serde_json::Value::Object(root)) = serde_json::to_value(self) else {
            return out;
        };
        render_section(&mut out, "global", &root);
        out
    }
}

impl NetworkConfig {
    fn apply_vars<F>(&mut self, network: Network, lookup: &F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = network.env_prefix();
        let var = |suffix: &str| {
            let name = format!("{prefix}_{suffix}");
            lookup(&name).map(|value| (name, value))
        };

        if let Some((_, v)) = var("ENABLED") {
            self.enabled = parse_bool(&v);
        }
        if let Some((name, v)) = var("FIRST") {
            self.first = parse_number(&name, &v)?;
        }
        if let Some((name, v)) = var("LAST") {
            self.last = parse_number(&name, &v)?;
        }
        if let Some((_, v)) = var("WITH_SIZE") {
            self.with_size = parse_bool(&v);
        }
        if let Some((name, v)) = var("PREV_SUM") {
            self.prev_sum = parse_number(&name, &v)?;
        }
        self.primary.apply_vars(prefix, lookup)?;

        let secondary_prefix = network.secondary_env_prefix();
        if let Some(v) = lookup(&format!("{secondary_prefix}_CHECK_SECONDARY")) {
            self.secondary.check_secondary = parse_bool(&v);
        }
        if let Some(v) = lookup(&format!("{secondary_prefix}_COPY_MISSING")) {
            self.secondary.copy_missing = parse_bool(&v);
        }
        let had_store = self.secondary.store.is_some();
        let mut store = self.secondary.store.take().unwrap_or_default();
        let touched = store.apply_vars(secondary_prefix, lookup)?;
        if had_store || touched || self.secondary.check_secondary {
            self.secondary.store = Some(store);
        }
        Ok(())
    }
}

impl StoreConfig {
    /// Apply `{prefix}_*` overrides; returns whether any variable was present.
    fn apply_vars<F>(&mut self, prefix: &str, lookup: &F) -> ConfigResult<bool>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut touched = false;
        let mut var = |suffix: &str| {
            let name = format!("{prefix}_{suffix}");
            let value = lookup(&name);
            touched |= value.is_some();
            value.map(|value| (name, value))
        };

        if let Some((_, v)) = var("ENDPOINT_URL") {
            self.endpoint_url = Some(v);
        }
        if let Some((_, v)) = var("REGION") {
            self.region = v;
        }
        if let Some((_, v)) = var("ACCESS_KEY_ID") {
            self.access_key_id = Some(v);
        }
        if let Some((_, v)) = var("SECRET_ACCESS_KEY") {
            self.secret_access_key = Some(v);
        }
        if let Some((_, v)) = var("BUCKET_NAME") {
            self.bucket_name = v;
        }
        if let Some((name, v)) = var("PAGE_SIZE") {
            self.page_size = Some(parse_number(&name, &v)?);
        }
        if let Some((name, v)) = var("MAX_ATTEMPTS") {
            self.max_attempts = parse_number(&name, &v)?;
        }
        Ok(touched)
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        field: field.to_owned(),
        value: value.to_owned(),
    })
}

fn is_sensitive(field: &str) -> bool {
    let lower = field.to_ascii_lowercase();
    SENSITIVE_FRAGMENTS.iter().any(|f| lower.contains(f))
}

fn render_section(
    out: &mut String,
    name: &str,
    fields: &serde_json::Map<String, serde_json::Value>,
) {
    let _ = writeln!(out, "[{name}]");
    for (field, value) in fields {
        let shown = match value {
            serde_json::Value::Object(_) => continue,
            serde_json::Value::Null => "(unset)".to_owned(),
            serde_json::Value::String(s) if is_sensitive(field) => mask_secret(s),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let _ = writeln!(out, "  {field} = {shown}");
    }
    let _ = writeln!(out);

    for (field, value) in fields {
        if let serde_json::Value::Object(child) = value {
            let child_name = if name == "global" {
                field.clone()
            } else {
                format!("{name}.{field}")
            };
            render_section(out, &child_name, child);
        }
    }
}
