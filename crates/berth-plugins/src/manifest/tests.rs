//! Unit tests for manifest parsing and validation.

use rstest::rstest;
use serde_json::{Value, json};

use super::PluginDescriptor;
use crate::error::ManifestViolation;

fn full_manifest() -> Value {
    json!({
        "name": "containers",
        "version": "1.2.0",
        "description": "Container lifecycle management",
        "author": "Berth contributors",
        "license": "MIT",
        "parts": {"panel": ["overview"], "machine": ["runner"]},
        "panel": {"platform": "any", "lang": "js", "index": "panel.js"},
        "machine": [
            {"platform": "linux", "lang": "js", "index": "machine.js"},
            {"platform": "windows", "lang": "js", "index": "machine-win.js"}
        ]
    })
}

// ---------------------------------------------------------------------------
// Successful parse
// ---------------------------------------------------------------------------

#[test]
fn full_manifest_parses() {
    let descriptor =
        PluginDescriptor::from_manifest(&full_manifest()).expect("manifest is valid");
    assert_eq!(descriptor.name(), "containers");
    assert_eq!(descriptor.version(), "1.2.0");
    assert_eq!(
        descriptor.description(),
        Some("Container lifecycle management")
    );
    assert_eq!(descriptor.author(), Some("Berth contributors"));
    assert_eq!(descriptor.license(), Some("MIT"));
    assert_eq!(descriptor.panel().len(), 1);
    assert_eq!(descriptor.machine().len(), 2);
}

#[test]
fn optional_metadata_may_be_absent() {
    let manifest = json!({
        "name": "bare",
        "version": "0.1.0",
        "parts": {},
        "panel": {"platform": "any", "lang": "js", "index": "p.js"},
        "machine": {"platform": "any", "lang": "js", "index": "m.js"}
    });
    let descriptor = PluginDescriptor::from_manifest(&manifest).expect("manifest is valid");
    assert!(descriptor.description().is_none());
    assert!(descriptor.author().is_none());
    assert!(descriptor.license().is_none());
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[rstest]
#[case::missing_name("name")]
#[case::missing_version("version")]
#[case::missing_parts("parts")]
fn missing_required_field_is_rejected(#[case] field: &str) {
    let mut manifest = full_manifest();
    manifest
        .as_object_mut()
        .expect("manifest is an object")
        .remove(field);
    let err = PluginDescriptor::from_manifest(&manifest).expect_err("manifest must be rejected");
    assert!(
        matches!(err, ManifestViolation::MissingField { field: found } if found == field),
        "unexpected violation: {err}"
    );
}

#[rstest]
#[case::numeric_name("name", json!(5))]
#[case::numeric_version("version", json!(1.2))]
#[case::object_description("description", json!({}))]
fn non_string_field_is_rejected(#[case] field: &str, #[case] value: Value) {
    let mut manifest = full_manifest();
    manifest
        .as_object_mut()
        .expect("manifest is an object")
        .insert(field.to_owned(), value);
    let err = PluginDescriptor::from_manifest(&manifest).expect_err("manifest must be rejected");
    assert!(matches!(err, ManifestViolation::NotAString { field: found } if found == field));
}

#[test]
fn empty_name_is_rejected() {
    let mut manifest = full_manifest();
    manifest
        .as_object_mut()
        .expect("manifest is an object")
        .insert("name".to_owned(), json!(""));
    let err = PluginDescriptor::from_manifest(&manifest).expect_err("manifest must be rejected");
    assert!(matches!(err, ManifestViolation::EmptyField { field: "name" }));
}

#[rstest]
#[case::panel("panel")]
#[case::machine("machine")]
fn invalid_facet_rejects_the_whole_manifest(#[case] facet: &str) {
    let mut manifest = full_manifest();
    manifest
        .as_object_mut()
        .expect("manifest is an object")
        .insert(facet.to_owned(), json!([{"platform": "linux"}]));
    let err = PluginDescriptor::from_manifest(&manifest).expect_err("manifest must be rejected");
    assert!(matches!(err, ManifestViolation::Environment { field, .. } if field == facet));
}

#[test]
fn non_object_root_is_rejected() {
    let err =
        PluginDescriptor::from_manifest(&json!(["not", "a", "manifest"])).expect_err("rejected");
    assert!(matches!(err, ManifestViolation::NotAnObject));
}

#[test]
fn syntax_error_is_rejected() {
    let err = PluginDescriptor::from_manifest_str("{not json").expect_err("rejected");
    assert!(matches!(err, ManifestViolation::Syntax { .. }));
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn descriptor_reserialises_identity_and_facets_exactly() {
    let manifest = full_manifest();
    let descriptor = PluginDescriptor::from_manifest(&manifest).expect("manifest is valid");
    let serialised = serde_json::to_value(&descriptor).expect("serialise descriptor");

    assert_eq!(serialised["name"], manifest["name"]);
    assert_eq!(serialised["version"], manifest["version"]);
    assert_eq!(serialised["parts"], manifest["parts"]);
    // The single panel object was normalised into a one-element sequence.
    assert_eq!(serialised["panel"], json!([manifest["panel"].clone()]));
    assert_eq!(serialised["machine"], manifest["machine"]);
}
