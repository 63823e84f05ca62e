//! Built-in JSON document engine.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use tracing::info;

use super::{DATABASE_TARGET, Database};
use crate::subsystems::SubsystemError;

/// File name of the persisted document inside the database directory.
const STORE_FILE: &str = "store.json";

/// Document store persisting named collections to one JSON file.
///
/// The whole store is read on `load` and written back on `close`; between
/// the two, collections are served from memory. A missing document loads
/// as an empty store.
#[derive(Debug)]
pub struct JsonDatabase {
    directory: Utf8PathBuf,
    collections: BTreeMap<String, Vec<Value>>,
}

impl JsonDatabase {
    /// Creates an engine persisting into `directory`.
    #[must_use]
    pub fn new(directory: impl Into<Utf8PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            collections: BTreeMap::new(),
        }
    }

    /// Directory the engine persists into.
    #[must_use]
    pub fn directory(&self) -> &Utf8Path {
        self.directory.as_path()
    }

    fn store_path(&self) -> Utf8PathBuf {
        self.directory.join(STORE_FILE)
    }
}

impl Database for JsonDatabase {
    fn load(&mut self) -> Result<(), SubsystemError> {
        fs::create_dir_all(&self.directory)
            .map_err(|source| SubsystemError::with_source("database", "load", source))?;

        let path = self.store_path();
        match fs::read_to_string(&path) {
            Ok(text) => {
                self.collections = serde_json::from_str(&text)
                    .map_err(|source| SubsystemError::with_source("database", "load", source))?;
            }
            Err(source) if source.kind() == ErrorKind::NotFound => {
                self.collections = BTreeMap::new();
            }
            Err(source) => {
                return Err(SubsystemError::with_source("database", "load", source));
            }
        }

        info!(
            target: DATABASE_TARGET,
            collections = self.collections.len(),
            path = path.as_str(),
            "database content loaded"
        );
        Ok(())
    }

    fn close(&mut self) -> Result<(), SubsystemError> {
        let text = serde_json::to_string_pretty(&self.collections)
            .map_err(|source| SubsystemError::with_source("database", "close", source))?;
        fs::write(self.store_path(), text)
            .map_err(|source| SubsystemError::with_source("database", "close", source))?;
        info!(target: DATABASE_TARGET, "database content persisted");
        Ok(())
    }

    fn records(&self, collection: &str) -> Result<Vec<Value>, SubsystemError> {
        Ok(self.collections.get(collection).cloned().unwrap_or_default())
    }
}
