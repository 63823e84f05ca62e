//! Log level recognised by the host.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ConfigError;

/// Verbosity levels the host logger accepts.
///
/// The configured `logLevel` string must name one of these variants; any
/// other value is rejected before the logger is touched.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    /// Operational messages only.
    #[default]
    Info,
    /// Adds diagnostic detail useful while developing plugins.
    Debug,
    /// Adds per-operation detail, including connection-level events.
    Trace,
}

impl LogLevel {
    /// Parses a configured level name, rejecting anything outside the set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownLogLevel`] when `value` does not name a
    /// recognised level.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        value.parse().map_err(|_| ConfigError::UnknownLogLevel {
            value: value.to_owned(),
        })
    }

    /// Returns the filter directive understood by the tracing subscriber.
    #[must_use]
    pub const fn filter_directive(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}
