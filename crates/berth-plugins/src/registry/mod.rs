//! Name-keyed registry of validated plugins and their lifecycle.
//!
//! [`PluginRegistry::load`] scans the plugin root once at host start-up.
//! Entries are processed sequentially in sorted name order, so duplicate
//! resolution is deterministic: the first entry to claim a name wins and
//! later claimants are logged and skipped, as is any entry whose manifest
//! fails validation. A failed entry never fails the scan — only an
//! unlistable root does.
//!
//! After loading, plugins are `Registered`; `enable` and `disable` toggle
//! them through the host's [`PluginActivator`], aborting on the first
//! failure, and `unload` drains the registry during shutdown.

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, error, info};

use crate::activator::PluginActivator;
use crate::error::{ManifestViolation, PluginError};
use crate::manifest::PluginDescriptor;

/// File name of the manifest expected in every plugin subdirectory.
pub const MANIFEST_FILE: &str = "plugin.json";

const REGISTRY_TARGET: &str = "berth::plugins";

/// Activation state of a registered plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    /// Validated and stored; facets not yet wired.
    Registered,
    /// Facets wired into the host.
    Enabled,
    /// Facets unwired after having been enabled.
    Disabled,
}

#[derive(Debug)]
struct RegisteredPlugin {
    descriptor: PluginDescriptor,
    state: ActivationState,
}

/// Counts reported by a completed scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    registered: usize,
    skipped: usize,
}

impl LoadSummary {
    /// Number of entries that became registered plugins.
    #[must_use]
    pub const fn registered(&self) -> usize {
        self.registered
    }

    /// Number of entries skipped for validation failures or duplicate
    /// names.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Registry of validated plugin descriptors, keyed by plugin name.
#[derive(Debug)]
pub struct PluginRegistry {
    root: Utf8PathBuf,
    plugins: BTreeMap<String, RegisteredPlugin>,
}

impl PluginRegistry {
    /// Creates an empty registry scanning `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            plugins: BTreeMap::new(),
        }
    }

    /// The plugin root directory this registry scans.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        self.root.as_path()
    }

    /// Scans the plugin root and registers every valid plugin.
    ///
    /// Invalid manifests and duplicate names are logged with the offending
    /// entry and skipped; they are counted in the returned summary but do
    /// not fail the call.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Scan`] when the plugin root cannot be
    /// listed.
    pub fn load(&mut self) -> Result<LoadSummary, PluginError> {
        let entries = self.scan_entries()?;
        let mut summary = LoadSummary::default();

        for entry in entries {
            match self.load_entry(&entry) {
                Ok(name) => {
                    summary.registered += 1;
                    debug!(target: REGISTRY_TARGET, entry = entry.as_str(), plugin = name.as_str(), "plugin registered");
                }
                Err(error) => {
                    summary.skipped += 1;
                    error!(target: REGISTRY_TARGET, %error, entry = entry.as_str(), "skipping plugin entry");
                }
            }
        }

        info!(
            target: REGISTRY_TARGET,
            registered = summary.registered,
            skipped = summary.skipped,
            root = self.root.as_str(),
            "plugin scan complete"
        );
        Ok(summary)
    }

    /// Wires every registered plugin into the host, first failure aborts.
    ///
    /// Plugins already enabled are left untouched, so a retry after a
    /// partial failure only activates the remainder.
    ///
    /// # Errors
    ///
    /// Propagates the first activation failure; plugins after the failing
    /// one stay in their previous state.
    pub fn enable(&mut self, activator: &mut dyn PluginActivator) -> Result<(), PluginError> {
        for (name, plugin) in &mut self.plugins {
            if plugin.state == ActivationState::Enabled {
                continue;
            }
            activator.activate(&plugin.descriptor)?;
            plugin.state = ActivationState::Enabled;
            debug!(target: REGISTRY_TARGET, plugin = name.as_str(), "plugin enabled");
        }
        Ok(())
    }

    /// Unwires every enabled plugin, first failure aborts.
    ///
    /// # Errors
    ///
    /// Propagates the first deactivation failure; plugins after the
    /// failing one stay enabled.
    pub fn disable(&mut self, activator: &mut dyn PluginActivator) -> Result<(), PluginError> {
        for (name, plugin) in &mut self.plugins {
            if plugin.state != ActivationState::Enabled {
                continue;
            }
            activator.deactivate(&plugin.descriptor)?;
            plugin.state = ActivationState::Disabled;
            debug!(target: REGISTRY_TARGET, plugin = name.as_str(), "plugin disabled");
        }
        Ok(())
    }

    /// Releases every registry entry, returning the registry to empty.
    pub fn unload(&mut self) {
        let released = self.plugins.len();
        self.plugins.clear();
        debug!(target: REGISTRY_TARGET, released, "plugins unloaded");
    }

    /// Looks up a plugin descriptor by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PluginDescriptor> {
        self.plugins.get(name).map(|plugin| &plugin.descriptor)
    }

    /// Activation state of a registered plugin.
    #[must_use]
    pub fn state(&self, name: &str) -> Option<ActivationState> {
        self.plugins.get(name).map(|plugin| plugin.state)
    }

    /// Names of all registered plugins, in sorted order.
    #[must_use]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    /// Number of registered plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` when no plugins are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    fn scan_entries(&self) -> Result<Vec<String>, PluginError> {
        let listing = fs::read_dir(&self.root).map_err(|source| PluginError::Scan {
            path: self.root.clone(),
            source: Arc::new(source),
        })?;

        let mut entries = Vec::new();
        for entry in listing {
            let entry = entry.map_err(|source| PluginError::Scan {
                path: self.root.clone(),
                source: Arc::new(source),
            })?;
            match entry.file_name().into_string() {
                Ok(name) => entries.push(name),
                Err(name) => {
                    error!(
                        target: REGISTRY_TARGET,
                        entry = name.to_string_lossy().as_ref(),
                        "skipping plugin entry with non-UTF-8 name"
                    );
                }
            }
        }

        // Listing order is platform-dependent; sorting keeps the
        // first-loaded-wins duplicate rule deterministic.
        entries.sort();
        Ok(entries)
    }

    fn load_entry(&mut self, entry: &str) -> Result<String, PluginError> {
        let manifest_path = self.root.join(entry).join(MANIFEST_FILE);
        let text = fs::read_to_string(&manifest_path).map_err(|source| PluginError::Manifest {
            entry: entry.to_owned(),
            source: ManifestViolation::Unreadable {
                source: Arc::new(source),
            },
        })?;

        let descriptor =
            PluginDescriptor::from_manifest_str(&text).map_err(|source| PluginError::Manifest {
                entry: entry.to_owned(),
                source,
            })?;

        let name = descriptor.name().to_owned();
        if self.plugins.contains_key(&name) {
            return Err(PluginError::Duplicate { name });
        }

        self.plugins.insert(
            name.clone(),
            RegisteredPlugin {
                descriptor,
                state: ActivationState::Registered,
            },
        );
        Ok(name)
    }
}
