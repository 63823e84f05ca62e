//! Load/save store for the configuration snapshot.

use std::fs;
use std::io::ErrorKind;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::ConfigError;
use crate::settings::Settings;

/// Owns the configuration document for the host process lifetime.
///
/// The store is created unloaded with pure defaults, loaded once during
/// host initialisation, and saved once during shutdown. An absent file is
/// not an error: the snapshot then consists entirely of defaults, and the
/// shutdown save materialises it (including any generated secret).
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: Utf8PathBuf,
    settings: Settings,
}

impl ConfigStore {
    /// Creates a store for the document at `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            settings: Settings::default(),
        }
    }

    /// Path of the on-disk document.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }

    /// The current snapshot.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Reads the document, merging defaults for missing keys.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file exists but cannot be
    /// read, or [`ConfigError::Parse`] when it is not a valid settings
    /// document. A missing file loads as pure defaults.
    pub fn load(&mut self) -> Result<(), ConfigError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                self.settings =
                    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                        path: self.path.clone(),
                        source,
                    })?;
                Ok(())
            }
            Err(source) if source.kind() == ErrorKind::NotFound => {
                self.settings = Settings::default();
                Ok(())
            }
            Err(source) => Err(ConfigError::Read {
                path: self.path.clone(),
                source: Arc::new(source),
            }),
        }
    }

    /// Writes the snapshot back to disk, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Encode`] when the snapshot cannot be
    /// serialised or [`ConfigError::Write`] when the file or its parent
    /// directory cannot be created.
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: self.path.clone(),
                source: Arc::new(source),
            })?;
        }
        let text = serde_json::to_string_pretty(&self.settings)
            .map_err(|source| ConfigError::Encode { source })?;
        fs::write(&self.path, text).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source: Arc::new(source),
        })
    }
}
