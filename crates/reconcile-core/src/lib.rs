//! Core types and configuration for bucket-reconcile.
//!
//! This crate holds everything the storage and engine crates share: the
//! per-network configuration model, the [`Network`] identifier, and the
//! configuration error type. Configuration is loaded from an optional JSON
//! file and then overridden by environment variables.

mod config;
mod error;
mod types;

pub use config::{NetworkConfig, ReconcileConfig, SecondaryConfig, StoreConfig, parse_bool};
pub use error::{ConfigError, ConfigResult};
pub use types::{Network, mask_secret};
