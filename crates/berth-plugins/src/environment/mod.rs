//! Plugin environment descriptors and the expansion rule.
//!
//! A manifest's `panel` and `machine` fields each describe one or more
//! environments — platform/language/entry-point bindings for that facet.
//! The field may be a single environment object or a sequence of them;
//! [`expand_environments`] normalises both shapes into an ordered sequence,
//! rejecting the whole field when any element is invalid. Expansion is a
//! pure function over parsed JSON: it performs no I/O and never partially
//! succeeds.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One platform/language/entry-point binding for a plugin facet.
///
/// Serialises with the manifest's field names (`lang`, `index`) so a
/// validated descriptor re-serialises to the shape it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginEnvironment {
    platform: String,
    #[serde(rename = "lang")]
    language: String,
    #[serde(rename = "index")]
    index_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    includes: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    excludes: Option<BTreeSet<String>>,
}

impl PluginEnvironment {
    /// Creates an environment without file filters.
    #[must_use]
    pub fn new(
        platform: impl Into<String>,
        language: impl Into<String>,
        index_file: impl Into<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            language: language.into(),
            index_file: index_file.into(),
            includes: None,
            excludes: None,
        }
    }

    /// Restricts the facet to the given file set.
    #[must_use]
    pub fn with_includes(mut self, includes: BTreeSet<String>) -> Self {
        self.includes = Some(includes);
        self
    }

    /// Excludes the given file set from the facet.
    #[must_use]
    pub fn with_excludes(mut self, excludes: BTreeSet<String>) -> Self {
        self.excludes = Some(excludes);
        self
    }

    /// Target platform name.
    #[must_use]
    pub fn platform(&self) -> &str {
        self.platform.as_str()
    }

    /// Implementation language of the facet.
    #[must_use]
    pub fn language(&self) -> &str {
        self.language.as_str()
    }

    /// Entry-point file for the facet.
    #[must_use]
    pub fn index_file(&self) -> &str {
        self.index_file.as_str()
    }

    /// Optional include filter.
    #[must_use]
    pub const fn includes(&self) -> Option<&BTreeSet<String>> {
        self.includes.as_ref()
    }

    /// Optional exclude filter.
    #[must_use]
    pub const fn excludes(&self) -> Option<&BTreeSet<String>> {
        self.excludes.as_ref()
    }
}

/// Reasons a whole environment field fails expansion.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpansionError {
    /// The field is absent from the manifest.
    #[error("field is missing")]
    Missing,

    /// The field is neither an object nor a sequence.
    #[error("expected an environment object or sequence, found {found}")]
    WrongShape {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// The field is a sequence with no elements.
    #[error("environment sequence is empty")]
    Empty,

    /// The field is a single environment object that failed validation.
    #[error("environment object is invalid: {reason}")]
    Object {
        /// What was wrong with the object.
        #[source]
        reason: ElementViolation,
    },

    /// One element of the sequence failed validation, invalidating the
    /// whole field.
    #[error("environment at position {position} is invalid: {reason}")]
    Element {
        /// Zero-based position of the failing element.
        position: usize,
        /// What was wrong with the element.
        #[source]
        reason: ElementViolation,
    },
}

/// Reasons a single environment element is invalid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ElementViolation {
    /// The element is not a JSON object.
    #[error("expected an object, found {found}")]
    NotAnObject {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// A required field is absent.
    #[error("field '{field}' is missing")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A required field carries a non-string value.
    #[error("field '{field}' must be a string")]
    NotAString {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A required field is present but empty.
    #[error("field '{field}' must not be empty")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// An optional filter is present but not a sequence of strings.
    #[error("filter '{field}' must be a sequence of strings")]
    InvalidFilter {
        /// Name of the offending filter.
        field: &'static str,
    },
}

/// Normalises a manifest environment field into an ordered sequence.
///
/// Accepts a single environment object (wrapped as a one-element sequence)
/// or a non-empty sequence of them. Every element must carry string-typed
/// `platform`, `lang`, and `index` fields; one invalid element invalidates
/// the entire field.
///
/// # Errors
///
/// Returns an [`ExpansionError`] describing why the field cannot be
/// normalised.
pub fn expand_environments(field: Option<&Value>) -> Result<Vec<PluginEnvironment>, ExpansionError> {
    match field {
        None => Err(ExpansionError::Missing),
        Some(Value::Array(items)) => {
            if items.is_empty() {
                return Err(ExpansionError::Empty);
            }
            items
                .iter()
                .enumerate()
                .map(|(position, item)| {
                    parse_environment(item)
                        .map_err(|reason| ExpansionError::Element { position, reason })
                })
                .collect()
        }
        Some(value @ Value::Object(_)) => parse_environment(value)
            .map(|environment| vec![environment])
            .map_err(|reason| ExpansionError::Object { reason }),
        Some(other) => Err(ExpansionError::WrongShape {
            found: json_kind(other),
        }),
    }
}

fn parse_environment(value: &Value) -> Result<PluginEnvironment, ElementViolation> {
    let object = value.as_object().ok_or(ElementViolation::NotAnObject {
        found: json_kind(value),
    })?;

    let platform = required_string(object, "platform")?;
    let language = required_string(object, "lang")?;
    let index_file = required_string(object, "index")?;
    let includes = optional_filter(object, "includes")?;
    let excludes = optional_filter(object, "excludes")?;

    Ok(PluginEnvironment {
        platform,
        language,
        index_file,
        includes,
        excludes,
    })
}

fn required_string(
    object: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<String, ElementViolation> {
    let value = object
        .get(field)
        .ok_or(ElementViolation::MissingField { field })?;
    let text = value
        .as_str()
        .ok_or(ElementViolation::NotAString { field })?;
    if text.is_empty() {
        return Err(ElementViolation::EmptyField { field });
    }
    Ok(text.to_owned())
}

fn optional_filter(
    object: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Option<BTreeSet<String>>, ElementViolation> {
    let Some(value) = object.get(field) else {
        return Ok(None);
    };
    let items = value
        .as_array()
        .ok_or(ElementViolation::InvalidFilter { field })?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_owned)
                .ok_or(ElementViolation::InvalidFilter { field })
        })
        .collect::<Result<BTreeSet<String>, ElementViolation>>()
        .map(Some)
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
