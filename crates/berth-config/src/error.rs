//! Errors raised while loading, validating, or persisting configuration.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised by the configuration store.
///
/// I/O sources are wrapped in `Arc` so the error stays cheap to move
/// through phase-level results.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read configuration '{path}': {source}")]
    Read {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The configuration file is not valid JSON for the settings schema.
    #[error("failed to parse configuration '{path}': {source}")]
    Parse {
        /// Path that was parsed.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory settings could not be serialised for saving.
    #[error("failed to encode configuration: {source}")]
    Encode {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The configuration file could not be written.
    #[error("failed to write configuration '{path}': {source}")]
    Write {
        /// Path that was written.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The configured log level is not in the recognised set.
    #[error("log level '{value}' does not exist")]
    UnknownLogLevel {
        /// The rejected value.
        value: String,
    },
}
