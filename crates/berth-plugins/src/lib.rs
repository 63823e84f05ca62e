//! Plugin discovery and validation for the Berth host.
//!
//! A plugin is a subdirectory of the configured plugin root containing a
//! `plugin.json` manifest. The manifest declares the plugin's identity
//! (`name`, `version`), optional metadata, an opaque `parts` structure the
//! host passes through uninterpreted, and two environment facets: `panel`
//! (what the panel serves) and `machine` (what managed machines run).
//!
//! Discovery is strict about validation and lenient about failure: a
//! manifest either expands into a fully valid [`PluginDescriptor`] or the
//! entry is logged and skipped — no partially valid descriptor is ever
//! registered, and one broken plugin never prevents the rest from loading.
//! Duplicate names are resolved first-loaded-wins, with entries processed
//! in sorted name order so the outcome is deterministic.
//!
//! Registered plugins move through an explicit activation lifecycle driven
//! by the host: `enable` and `disable` wire and unwire each descriptor's
//! facets through a [`PluginActivator`], and `unload` drains the registry
//! during shutdown.

pub mod activator;
pub mod environment;
pub mod error;
pub mod manifest;
pub mod registry;

pub use self::activator::PluginActivator;
pub use self::environment::{ElementViolation, ExpansionError, PluginEnvironment};
pub use self::error::{ManifestViolation, PluginError};
pub use self::manifest::PluginDescriptor;
pub use self::registry::{ActivationState, LoadSummary, PluginRegistry};
