//! Domain errors raised by plugin discovery and activation.
//!
//! All errors use `thiserror`-derived enums with structured context so the
//! host can inspect failures programmatically. I/O errors are wrapped in
//! `Arc` to keep the variants small and clone-friendly.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::environment::ExpansionError;

/// Reasons a plugin manifest is rejected during validation.
///
/// A manifest either parses into a fully valid descriptor or is rejected
/// with one of these violations; there is no partially valid outcome.
#[derive(Debug, Error)]
pub enum ManifestViolation {
    /// The manifest file could not be read.
    #[error("manifest could not be read: {source}")]
    Unreadable {
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The manifest is not valid JSON.
    #[error("manifest is not valid JSON: {source}")]
    Syntax {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The manifest root is not a JSON object.
    #[error("manifest root must be an object")]
    NotAnObject,

    /// A required field is absent.
    #[error("field '{field}' is missing")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A field carries a non-string value where a string is required.
    #[error("field '{field}' must be a string")]
    NotAString {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A required string field is present but empty.
    #[error("field '{field}' must not be empty")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// An environment facet failed the expansion rule.
    #[error("field '{field}' does not describe a valid environment set: {source}")]
    Environment {
        /// The facet field (`panel` or `machine`).
        field: &'static str,
        /// Why expansion failed.
        #[source]
        source: ExpansionError,
    },
}

/// Errors arising from plugin registry operations.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The plugin root directory could not be listed.
    #[error("failed to scan plugin directory '{path}': {source}")]
    Scan {
        /// Directory that was scanned.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A plugin entry's manifest was rejected; the entry is skipped.
    #[error("plugin entry '{entry}' could not be loaded: {source}")]
    Manifest {
        /// Name of the plugin subdirectory.
        entry: String,
        /// Why the manifest was rejected.
        #[source]
        source: ManifestViolation,
    },

    /// A plugin with the same name was already loaded; the later entry is
    /// skipped.
    #[error("plugin '{name}' has already been loaded")]
    Duplicate {
        /// The colliding plugin name.
        name: String,
    },

    /// The host failed to wire a plugin's facets during activation.
    #[error("activation of plugin '{name}' failed: {message}")]
    Activation {
        /// Plugin name.
        name: String,
        /// Human-readable failure description.
        message: String,
    },
}
