//! Collaborator traits the supervisor drives, and their shared error type.
//!
//! Each trait is the narrow seam between the supervisor and one subsystem.
//! Production implementations live in this crate ([`crate::transport`],
//! [`crate::users`], [`crate::daemons`]); tests substitute recording fakes
//! to observe phase ordering without touching the network or filesystem.

use std::error::Error;

use berth_config::AuthSettings;
use thiserror::Error as ThisError;

use crate::database::Database;

/// A failure reported by a subsystem collaborator during a phase step.
#[derive(Debug, ThisError)]
#[error("subsystem '{subsystem}' failed during {operation}: {message}")]
pub struct SubsystemError {
    subsystem: &'static str,
    operation: &'static str,
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl SubsystemError {
    /// Creates an error without an underlying cause.
    #[must_use]
    pub fn new(
        subsystem: &'static str,
        operation: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            subsystem,
            operation,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping an underlying cause.
    #[must_use]
    pub fn with_source(
        subsystem: &'static str,
        operation: &'static str,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            subsystem,
            operation,
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Name of the subsystem that failed.
    #[must_use]
    pub const fn subsystem(&self) -> &'static str {
        self.subsystem
    }

    /// Operation that was in progress when the failure occurred.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        self.operation
    }
}

/// A network server owned by the supervisor.
///
/// Both the panel-facing API server and the machine-facing daemon server
/// implement this trait; the supervisor holds one handle for each role.
/// `mount`/`unmount` are the narrow wiring surface other subsystems and
/// plugin activation use to claim path segments — request routing itself is
/// the server's concern, not the supervisor's.
pub trait PortServer {
    /// Prepares the server's static state before any listener exists.
    ///
    /// # Errors
    ///
    /// Returns a [`SubsystemError`] when the server cannot be prepared.
    fn initialize(&mut self) -> Result<(), SubsystemError>;

    /// Claims a path segment on this server.
    ///
    /// Mounting an already-claimed segment is a no-op, so re-activation
    /// after a partial failure stays safe.
    ///
    /// # Errors
    ///
    /// Returns a [`SubsystemError`] when the segment cannot be claimed.
    fn mount(&mut self, segment: &str) -> Result<(), SubsystemError>;

    /// Releases a previously claimed path segment.
    ///
    /// # Errors
    ///
    /// Returns a [`SubsystemError`] when the segment cannot be released.
    fn unmount(&mut self, segment: &str) -> Result<(), SubsystemError>;

    /// Binds the listener and begins accepting connections.
    ///
    /// # Errors
    ///
    /// Returns a [`SubsystemError`] when the port cannot be bound.
    fn start(&mut self, port: u16) -> Result<(), SubsystemError>;

    /// Stops accepting connections and releases the listener.
    ///
    /// # Errors
    ///
    /// Returns a [`SubsystemError`] when shutdown does not complete
    /// cleanly.
    fn close(&mut self) -> Result<(), SubsystemError>;
}

/// The user registry subsystem.
pub trait UserSubsystem {
    /// Wires the subsystem with its dependencies: the resolved database,
    /// the API server it claims segments on, and the auth material used
    /// for issued tokens.
    ///
    /// # Errors
    ///
    /// Returns a [`SubsystemError`] when the auth material is unusable or
    /// the API segment cannot be claimed.
    fn initialize(
        &mut self,
        database: &dyn Database,
        api: &mut dyn PortServer,
        auth: &AuthSettings,
    ) -> Result<(), SubsystemError>;

    /// Loads user records from persisted database content.
    ///
    /// # Errors
    ///
    /// Returns a [`SubsystemError`] when the backing collection cannot be
    /// read.
    fn load(&mut self, database: &dyn Database) -> Result<(), SubsystemError>;
}

/// The managed-daemon registry subsystem.
pub trait DaemonSubsystem {
    /// Wires the subsystem with its dependencies: the resolved database
    /// and the two servers it claims segments on.
    ///
    /// # Errors
    ///
    /// Returns a [`SubsystemError`] when a segment cannot be claimed.
    fn initialize(
        &mut self,
        database: &dyn Database,
        daemon_server: &mut dyn PortServer,
        api: &mut dyn PortServer,
    ) -> Result<(), SubsystemError>;

    /// Loads daemon records from persisted database content.
    ///
    /// # Errors
    ///
    /// Returns a [`SubsystemError`] when the backing collection cannot be
    /// read.
    fn load(&mut self, database: &dyn Database) -> Result<(), SubsystemError>;
}
