//! Manifest parsing into validated plugin descriptors.
//!
//! A `plugin.json` manifest declares the plugin's identity, optional
//! metadata, an opaque `parts` structure, and the `panel` and `machine`
//! environment facets. Parsing is a typed, all-or-nothing step: the result
//! is either a [`PluginDescriptor`] whose invariants all hold, or a
//! [`ManifestViolation`] naming the first problem found.

use serde::Serialize;
use serde_json::Value;

use crate::environment::{PluginEnvironment, expand_environments};
use crate::error::ManifestViolation;

/// A validated plugin: identity, metadata, and its two environment facets.
///
/// Invariants enforced at construction: `name` and `version` are non-empty
/// strings, `parts` is present, and both facets expanded to non-empty,
/// fully valid environment sequences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginDescriptor {
    name: String,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license: Option<String>,
    parts: Value,
    panel: Vec<PluginEnvironment>,
    machine: Vec<PluginEnvironment>,
}

impl PluginDescriptor {
    /// Parses and validates a manifest document.
    ///
    /// # Errors
    ///
    /// Returns a [`ManifestViolation`] when the text is not valid JSON or
    /// any descriptor invariant fails.
    pub fn from_manifest_str(text: &str) -> Result<Self, ManifestViolation> {
        let manifest: Value =
            serde_json::from_str(text).map_err(|source| ManifestViolation::Syntax { source })?;
        Self::from_manifest(&manifest)
    }

    /// Validates an already-parsed manifest value.
    ///
    /// # Errors
    ///
    /// Returns a [`ManifestViolation`] when any descriptor invariant fails.
    pub fn from_manifest(manifest: &Value) -> Result<Self, ManifestViolation> {
        let object = manifest.as_object().ok_or(ManifestViolation::NotAnObject)?;

        let name = required_string(object, "name")?;
        let version = required_string(object, "version")?;
        let description = optional_string(object, "description")?;
        let author = optional_string(object, "author")?;
        let license = optional_string(object, "license")?;
        let parts = object
            .get("parts")
            .cloned()
            .ok_or(ManifestViolation::MissingField { field: "parts" })?;

        let panel = expand_environments(object.get("panel"))
            .map_err(|source| ManifestViolation::Environment {
                field: "panel",
                source,
            })?;
        let machine = expand_environments(object.get("machine")).map_err(|source| {
            ManifestViolation::Environment {
                field: "machine",
                source,
            }
        })?;

        Ok(Self {
            name,
            version,
            description,
            author,
            license,
            parts,
            panel,
            machine,
        })
    }

    /// Unique plugin name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Declared plugin version.
    #[must_use]
    pub fn version(&self) -> &str {
        self.version.as_str()
    }

    /// Optional human-readable description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Optional author.
    #[must_use]
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// Optional license identifier.
    #[must_use]
    pub fn license(&self) -> Option<&str> {
        self.license.as_deref()
    }

    /// The declared parts, passed through uninterpreted.
    #[must_use]
    pub const fn parts(&self) -> &Value {
        &self.parts
    }

    /// Environments the panel facet runs in. Never empty.
    #[must_use]
    pub fn panel(&self) -> &[PluginEnvironment] {
        &self.panel
    }

    /// Environments the machine facet runs in. Never empty.
    #[must_use]
    pub fn machine(&self) -> &[PluginEnvironment] {
        &self.machine
    }
}

fn required_string(
    object: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<String, ManifestViolation> {
    let value = object
        .get(field)
        .ok_or(ManifestViolation::MissingField { field })?;
    let text = value
        .as_str()
        .ok_or(ManifestViolation::NotAString { field })?;
    if text.is_empty() {
        return Err(ManifestViolation::EmptyField { field });
    }
    Ok(text.to_owned())
}

fn optional_string(
    object: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ManifestViolation> {
    match object.get(field) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(|text| Some(text.to_owned()))
            .ok_or(ManifestViolation::NotAString { field }),
    }
}

#[cfg(test)]
mod tests;
