//! Typed settings tree mirroring the on-disk configuration schema.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::ConfigError;
use crate::level::LogLevel;

/// Root of the configuration snapshot.
///
/// Each section deserialises with per-field defaults, so a document missing
/// any key — or missing entirely — resolves to the documented default for
/// exactly the absent keys while present keys keep the caller's values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    api: ApiSettings,
    #[serde(default)]
    daemon: DaemonSettings,
    #[serde(default)]
    database: DatabaseSettings,
    #[serde(default)]
    plugins: PluginSettings,
    #[serde(rename = "logLevel", default = "defaults::default_log_level")]
    log_level: String,
}

impl Settings {
    /// Settings for the panel-facing API server.
    #[must_use]
    pub const fn api(&self) -> &ApiSettings {
        &self.api
    }

    /// Settings for the machine-facing daemon server.
    #[must_use]
    pub const fn daemon(&self) -> &DaemonSettings {
        &self.daemon
    }

    /// Settings for the database engine.
    #[must_use]
    pub const fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    /// Settings for plugin discovery.
    #[must_use]
    pub const fn plugins(&self) -> &PluginSettings {
        &self.plugins
    }

    /// The raw configured log level name.
    #[must_use]
    pub fn log_level_name(&self) -> &str {
        self.log_level.as_str()
    }

    /// Validates the configured log level against the recognised set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownLogLevel`] when the configured value is
    /// not one of `info`, `debug`, or `trace`.
    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        LogLevel::parse(&self.log_level)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            daemon: DaemonSettings::default(),
            database: DatabaseSettings::default(),
            plugins: PluginSettings::default(),
            log_level: defaults::default_log_level(),
        }
    }
}

/// API server section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "defaults::default_api_port")]
    port: u16,
    #[serde(default)]
    auth: AuthSettings,
}

impl ApiSettings {
    /// Port the API listener binds.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Auth material handed to the user subsystem.
    #[must_use]
    pub const fn auth(&self) -> &AuthSettings {
        &self.auth
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            port: defaults::default_api_port(),
            auth: AuthSettings::default(),
        }
    }
}

/// Auth material for issued API tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "defaults::generated_secret")]
    secret: String,
    #[serde(rename = "expiresIn", default = "defaults::default_token_lifetime")]
    expires_in: String,
}

impl AuthSettings {
    /// The signing secret; generated when the configuration carries none.
    #[must_use]
    pub fn secret(&self) -> &str {
        self.secret.as_str()
    }

    /// Token lifetime expression (e.g. `5d`).
    #[must_use]
    pub fn expires_in(&self) -> &str {
        self.expires_in.as_str()
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            secret: defaults::generated_secret(),
            expires_in: defaults::default_token_lifetime(),
        }
    }
}

/// Daemon server section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonSettings {
    #[serde(default = "defaults::default_daemon_port")]
    port: u16,
}

impl DaemonSettings {
    /// Port the daemon listener binds.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            port: defaults::default_daemon_port(),
        }
    }
}

/// Database engine section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(rename = "type", default = "defaults::default_database_kind")]
    kind: String,
    #[serde(default = "defaults::default_database_path")]
    path: Utf8PathBuf,
}

impl DatabaseSettings {
    /// Name of the engine to instantiate.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.kind.as_str()
    }

    /// Directory the engine persists into, relative to the host root.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            kind: defaults::default_database_kind(),
            path: defaults::default_database_path(),
        }
    }
}

/// Plugin discovery section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSettings {
    #[serde(default = "defaults::default_plugin_path")]
    path: Utf8PathBuf,
}

impl PluginSettings {
    /// Directory scanned for plugin subdirectories, relative to the host
    /// root.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            path: defaults::default_plugin_path(),
        }
    }
}
