//! Configuration snapshot shared by the Berth host binaries.
//!
//! The host reads a single JSON document at boot, fills in documented
//! defaults for any missing key, hands typed sections to the subsystems it
//! wires, and writes the document back during shutdown so generated values
//! (such as the API auth secret) survive restarts.
//!
//! The on-disk schema mirrors the settings tree:
//!
//! ```json
//! {
//!   "api": {"port": 8080, "auth": {"secret": "...", "expiresIn": "5d"}},
//!   "daemon": {"port": 8081},
//!   "database": {"type": "json", "path": "./data/"},
//!   "plugins": {"path": "./plugins/"},
//!   "logLevel": "info"
//! }
//! ```
//!
//! Every key is optional; absent keys resolve to the defaults declared in
//! [`defaults`].

pub mod defaults;
mod error;
mod level;
mod settings;
mod store;

pub use self::error::ConfigError;
pub use self::level::LogLevel;
pub use self::settings::{
    ApiSettings, AuthSettings, DaemonSettings, DatabaseSettings, PluginSettings, Settings,
};
pub use self::store::ConfigStore;
