//! Pluggable storage: the database contract, the engine registry, and the
//! built-in JSON engine.
//!
//! The supervisor never constructs a concrete engine itself. Known engines
//! are registered by type name in a [`DatabaseTypeRegistry`], and the
//! configured `database.type` selects which constructor runs. The built-in
//! `json` engine persists named collections to a single document under the
//! configured directory.

use std::collections::BTreeMap;

use berth_config::DatabaseSettings;
use camino::Utf8Path;
use serde_json::Value;
use tracing::debug;

use crate::subsystems::SubsystemError;

mod json;

pub use self::json::JsonDatabase;

const DATABASE_TARGET: &str = "berth::database";

/// Contract every database engine fulfils for the supervisor.
pub trait Database {
    /// Loads persisted content into memory.
    ///
    /// # Errors
    ///
    /// Returns a [`SubsystemError`] when persisted content cannot be read.
    fn load(&mut self) -> Result<(), SubsystemError>;

    /// Flushes content and releases the engine.
    ///
    /// # Errors
    ///
    /// Returns a [`SubsystemError`] when content cannot be persisted.
    fn close(&mut self) -> Result<(), SubsystemError>;

    /// Returns the records of a named collection; unknown collections are
    /// empty, not errors.
    ///
    /// # Errors
    ///
    /// Returns a [`SubsystemError`] when the engine cannot produce the
    /// collection.
    fn records(&self, collection: &str) -> Result<Vec<Value>, SubsystemError>;
}

/// Constructor registered for one engine type name.
pub type DatabaseConstructor =
    Box<dyn Fn(&DatabaseSettings, &Utf8Path) -> Result<Box<dyn Database>, SubsystemError>>;

/// Registry mapping engine type names to constructors.
#[derive(Default)]
pub struct DatabaseTypeRegistry {
    constructors: BTreeMap<String, DatabaseConstructor>,
}

impl std::fmt::Debug for DatabaseTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseTypeRegistry")
            .field("types", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DatabaseTypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an engine constructor under `kind`, replacing any earlier
    /// registration of the same name.
    pub fn register(&mut self, kind: impl Into<String>, constructor: DatabaseConstructor) {
        let kind = kind.into();
        debug!(target: DATABASE_TARGET, kind = kind.as_str(), "database engine registered");
        self.constructors.insert(kind, constructor);
    }

    /// Instantiates the engine selected by the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`SubsystemError`] when no engine is registered under the
    /// configured type name, or when the constructor itself fails.
    pub fn open(
        &self,
        settings: &DatabaseSettings,
        root: &Utf8Path,
    ) -> Result<Box<dyn Database>, SubsystemError> {
        let constructor = self.constructors.get(settings.kind()).ok_or_else(|| {
            SubsystemError::new(
                "database",
                "open",
                format!("unknown database type '{}'", settings.kind()),
            )
        })?;
        constructor(settings, root)
    }
}
