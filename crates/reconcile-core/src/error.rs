//! Error types for configuration loading.

use std::path::PathBuf;

/// Error raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required setting is absent for an enabled network.
    #[error("missing configuration value: {field}")]
    Missing {
        /// Name of the missing setting.
        field: String,
    },

    /// A setting could not be parsed.
    #[error("invalid value for {field}: {value:?}")]
    Invalid {
        /// Name of the offending setting.
        field: String,
        /// The raw value that failed to parse.
        value: String,
    },

    /// The configuration file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Read {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the config schema.
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        /// Path of the file.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
