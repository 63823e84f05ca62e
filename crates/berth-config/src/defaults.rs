//! Default values applied to configuration keys that are absent on disk.

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Default TCP port for the panel-facing API server.
pub const DEFAULT_API_PORT: u16 = 8080;

/// Default TCP port for the machine-facing daemon server.
pub const DEFAULT_DAEMON_PORT: u16 = 8081;

/// Default lifetime of issued auth tokens.
pub const DEFAULT_TOKEN_LIFETIME: &str = "5d";

/// Default database engine name.
pub const DEFAULT_DATABASE_KIND: &str = "json";

/// Default directory for database content, relative to the host root.
pub const DEFAULT_DATABASE_PATH: &str = "./data/";

/// Default directory scanned for plugins, relative to the host root.
pub const DEFAULT_PLUGIN_PATH: &str = "./plugins/";

/// Default log level name.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Length of a generated API auth secret.
const SECRET_LENGTH: usize = 32;

/// Generates a fresh alphanumeric auth secret.
///
/// Invoked only when the configuration carries no secret; the shutdown save
/// persists the generated value so tokens stay valid across restarts.
pub fn generated_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LENGTH)
        .map(char::from)
        .collect()
}

pub(crate) const fn default_api_port() -> u16 {
    DEFAULT_API_PORT
}

pub(crate) const fn default_daemon_port() -> u16 {
    DEFAULT_DAEMON_PORT
}

pub(crate) fn default_token_lifetime() -> String {
    DEFAULT_TOKEN_LIFETIME.to_owned()
}

pub(crate) fn default_database_kind() -> String {
    DEFAULT_DATABASE_KIND.to_owned()
}

pub(crate) fn default_database_path() -> camino::Utf8PathBuf {
    camino::Utf8PathBuf::from(DEFAULT_DATABASE_PATH)
}

pub(crate) fn default_plugin_path() -> camino::Utf8PathBuf {
    camino::Utf8PathBuf::from(DEFAULT_PLUGIN_PATH)
}

pub(crate) fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_owned()
}

#[cfg(test)]
mod tests {
    use super::generated_secret;

    #[test]
    fn generated_secret_is_32_alphanumeric_chars() {
        let secret = generated_secret();
        assert_eq!(secret.chars().count(), 32);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn generated_secrets_differ() {
        assert_ne!(generated_secret(), generated_secret());
    }
}
