//! The subsystem lifecycle orchestrator.
//!
//! The [`Supervisor`] owns every subsystem handle for the process lifetime
//! and drives three ordered phases. Each phase is fail-fast: the first
//! error aborts the remaining steps of that phase and surfaces to the
//! caller unmodified. A phase that fails leaves the supervisor in its
//! transitional state, so re-invocation and out-of-order calls are
//! rejected with [`PhaseOrderError`] instead of repeating side effects.
//!
//! Teardown is the one deliberate exception to fail-fast: by default every
//! stop step is attempted and failures are aggregated, because aborting
//! cleanup on the first failure leaks listeners and unsaved state. Callers
//! needing the historical abort-on-first-failure semantics can select
//! [`TeardownPolicy::FailFast`].

use berth_config::{ConfigError, ConfigStore, Settings};
use berth_plugins::{PluginError, PluginRegistry};
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{error, info};

use crate::activation::FacetWiring;
use crate::daemons::DaemonDirectory;
use crate::database::{Database, DatabaseTypeRegistry, JsonDatabase};
use crate::paths;
use crate::subsystems::{DaemonSubsystem, PortServer, SubsystemError, UserSubsystem};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::transport::NetServer;
use crate::users::UserDirectory;

const CORE_TARGET: &str = "berth::core";

/// File name of the configuration document under the host root.
const CONFIG_FILE: &str = "config.json";

/// Directory under the host root receiving log files.
const LOG_DIRECTORY: &str = "logs";

/// Name of the host's log file (`core.log`).
const LOG_NAME: &str = "core";

/// Lifecycle phase of the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed; nothing has run.
    Uninitialized,
    /// `initialize` is in progress or failed part-way.
    Initializing,
    /// `initialize` completed; ready to start.
    Ready,
    /// `start` is in progress or failed part-way.
    Starting,
    /// `start` completed; the host is serving.
    Running,
    /// `stop` is in progress or failed part-way.
    Stopping,
    /// `stop` completed.
    Stopped,
}

impl Phase {
    /// Canonical lowercase name of the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How `stop` reacts to a failing teardown step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TeardownPolicy {
    /// Attempt every teardown step and aggregate failures.
    #[default]
    BestEffort,
    /// Abort remaining teardown steps on the first failure.
    FailFast,
}

/// A phase operation was invoked out of sequence.
#[derive(Debug, Error)]
#[error("{operation} requires phase '{expected}', but the host is '{actual}'")]
pub struct PhaseOrderError {
    /// Operation that was rejected.
    operation: &'static str,
    /// Phase the operation requires.
    expected: Phase,
    /// Phase the supervisor was actually in.
    actual: Phase,
}

impl PhaseOrderError {
    /// Phase the rejected operation requires.
    #[must_use]
    pub const fn expected(&self) -> Phase {
        self.expected
    }

    /// Phase the supervisor was in when the operation was rejected.
    #[must_use]
    pub const fn actual(&self) -> Phase {
        self.actual
    }
}

/// Errors surfaced by phase operations.
#[derive(Debug, Error)]
pub enum HostError {
    /// A phase operation was invoked out of sequence.
    #[error(transparent)]
    PhaseOrder(#[from] PhaseOrderError),

    /// Configuration could not be loaded, validated, or saved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The plugin registry failed at phase level (scan or activation).
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// A subsystem collaborator failed during a phase step.
    #[error(transparent)]
    Subsystem(#[from] SubsystemError),

    /// The logger could not be initialised.
    #[error("telemetry initialisation failed: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },

    /// Best-effort teardown completed, but one or more steps failed.
    #[error("teardown finished with {} unrecovered failure(s)", .failures.len())]
    Teardown {
        /// Every failure observed during teardown, in step order.
        failures: Vec<HostError>,
    },
}

/// The collaborators handed to the supervisor at construction.
///
/// Groups the boxed subsystem handles into one parameter object; the
/// supervisor takes exclusive ownership of all of them.
pub struct Subsystems {
    /// The panel-facing API server.
    pub api_server: Box<dyn PortServer>,
    /// The machine-facing daemon server.
    pub daemon_server: Box<dyn PortServer>,
    /// The user registry subsystem.
    pub users: Box<dyn UserSubsystem>,
    /// The managed-daemon registry subsystem.
    pub daemons: Box<dyn DaemonSubsystem>,
    /// Database engine constructors known ahead of initialisation.
    pub database_types: DatabaseTypeRegistry,
}

/// Orchestrates the host's subsystems through initialize, start, and stop.
pub struct Supervisor {
    root: Utf8PathBuf,
    phase: Phase,
    teardown: TeardownPolicy,
    config: ConfigStore,
    api_server: Box<dyn PortServer>,
    daemon_server: Box<dyn PortServer>,
    users: Box<dyn UserSubsystem>,
    daemons: Box<dyn DaemonSubsystem>,
    database_types: DatabaseTypeRegistry,
    database: Option<Box<dyn Database>>,
    plugins: Option<PluginRegistry>,
    telemetry: Option<TelemetryHandle>,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("root", &self.root)
            .field("phase", &self.phase)
            .field("teardown", &self.teardown)
            .finish()
    }
}

impl Supervisor {
    /// Creates a supervisor rooted at `root` with the given collaborators.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>, subsystems: Subsystems) -> Self {
        let root = root.into();
        let config = ConfigStore::new(root.join(CONFIG_FILE));
        Self {
            root,
            phase: Phase::Uninitialized,
            teardown: TeardownPolicy::default(),
            config,
            api_server: subsystems.api_server,
            daemon_server: subsystems.daemon_server,
            users: subsystems.users,
            daemons: subsystems.daemons,
            database_types: subsystems.database_types,
            database: None,
            plugins: None,
            telemetry: None,
        }
    }

    /// Creates a supervisor wired with the system subsystem
    /// implementations.
    #[must_use]
    pub fn system(root: impl Into<Utf8PathBuf>) -> Self {
        Self::new(
            root,
            Subsystems {
                api_server: Box::new(NetServer::new("api")),
                daemon_server: Box::new(NetServer::new("daemon")),
                users: Box::new(UserDirectory::new()),
                daemons: Box::new(DaemonDirectory::new()),
                database_types: DatabaseTypeRegistry::new(),
            },
        )
    }

    /// Selects how `stop` reacts to failing teardown steps.
    #[must_use]
    pub const fn with_teardown_policy(mut self, policy: TeardownPolicy) -> Self {
        self.teardown = policy;
        self
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The configuration snapshot (defaults until `initialize` has run).
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        self.config.settings()
    }

    /// The plugin registry, once `initialize` has created it.
    #[must_use]
    pub const fn plugins(&self) -> Option<&PluginRegistry> {
        self.plugins.as_ref()
    }

    /// Loads configuration and wires every subsystem, in dependency order.
    ///
    /// Steps: load configuration; validate the configured log level;
    /// initialise the logger under the root-relative log directory;
    /// initialise the API and daemon servers; create the plugin registry
    /// against the configured plugin directory and load all discoverable
    /// plugins; register known database engines and instantiate the
    /// configured one; wire the user subsystem (database, API server, auth
    /// settings); wire the daemon subsystem (database, daemon server, API
    /// server).
    ///
    /// # Errors
    ///
    /// The first failing step aborts the remainder and surfaces unchanged.
    /// The supervisor then stays in [`Phase::Initializing`] — a partially
    /// initialised host never reports itself ready.
    pub fn initialize(&mut self) -> Result<(), HostError> {
        self.expect_phase("initialize", Phase::Uninitialized)?;
        self.phase = Phase::Initializing;

        self.config.load()?;
        let level = self.config.settings().log_level()?;

        let log_directory = self.root.join(LOG_DIRECTORY);
        let handle = telemetry::initialise(&log_directory, LOG_NAME, level)
            .map_err(|source| HostError::Telemetry { source })?;
        self.telemetry = Some(handle);

        self.api_server.initialize()?;
        self.daemon_server.initialize()?;

        let plugin_root = paths::resolve(&self.root, self.config.settings().plugins().path());
        let mut plugins = PluginRegistry::new(plugin_root);
        plugins.load()?;
        self.plugins = Some(plugins);

        self.database_types
            .register("json", Box::new(open_json_database));
        let database = self
            .database_types
            .open(self.config.settings().database(), &self.root)?;

        let auth = self.config.settings().api().auth().clone();
        self.users
            .initialize(database.as_ref(), self.api_server.as_mut(), &auth)?;
        self.daemons.initialize(
            database.as_ref(),
            self.daemon_server.as_mut(),
            self.api_server.as_mut(),
        )?;
        self.database = Some(database);

        self.phase = Phase::Ready;
        info!(target: CORE_TARGET, "core initialized");
        Ok(())
    }

    /// Brings the stateful subsystems online and enables loaded plugins.
    ///
    /// Steps: load persisted database content; load users and daemons from
    /// the database; start the daemon listener; start the API listener;
    /// enable all loaded plugins.
    ///
    /// # Errors
    ///
    /// The first failing step aborts the remainder and surfaces unchanged;
    /// the supervisor stays in [`Phase::Starting`].
    pub fn start(&mut self) -> Result<(), HostError> {
        self.expect_phase("start", Phase::Ready)?;
        self.phase = Phase::Starting;

        self.database
            .as_deref_mut()
            .ok_or_else(|| missing_subsystem("database"))?
            .load()?;

        let database = self
            .database
            .as_deref()
            .ok_or_else(|| missing_subsystem("database"))?;
        self.users.load(database)?;
        self.daemons.load(database)?;

        let daemon_port = self.config.settings().daemon().port();
        let api_port = self.config.settings().api().port();
        self.daemon_server.start(daemon_port)?;
        self.api_server.start(api_port)?;

        self.enable_plugins()?;

        self.phase = Phase::Running;
        info!(target: CORE_TARGET, "core started");
        Ok(())
    }

    /// Shuts the host down, recording `reason` with the final log line.
    ///
    /// Steps: disable all plugins; close the API server; close the daemon
    /// server; close the database; unload all plugins; persist the
    /// configuration; record the shutdown reason and close the logger.
    ///
    /// # Errors
    ///
    /// Under [`TeardownPolicy::BestEffort`] every step is attempted and
    /// failures are aggregated into [`HostError::Teardown`]. Under
    /// [`TeardownPolicy::FailFast`] the first failure is logged and
    /// surfaced immediately, skipping the remaining steps; the supervisor
    /// then stays in [`Phase::Stopping`].
    pub fn stop(&mut self, reason: &str) -> Result<(), HostError> {
        self.expect_phase("stop", Phase::Running)?;
        self.phase = Phase::Stopping;
        info!(target: CORE_TARGET, reason, "stopping core");

        let policy = self.teardown;
        let mut failures = Vec::new();

        let disabled = self.disable_plugins();
        note_teardown_failure(policy, &mut failures, disabled)?;

        let api_closed = self.api_server.close().map_err(HostError::from);
        note_teardown_failure(policy, &mut failures, api_closed)?;

        let daemon_closed = self.daemon_server.close().map_err(HostError::from);
        note_teardown_failure(policy, &mut failures, daemon_closed)?;

        let database_closed = self.close_database();
        note_teardown_failure(policy, &mut failures, database_closed)?;

        if let Some(plugins) = self.plugins.as_mut() {
            plugins.unload();
        }

        let config_saved = self.config.save().map_err(HostError::from);
        note_teardown_failure(policy, &mut failures, config_saved)?;

        info!(target: CORE_TARGET, reason, "core stopped");
        let logger_closed = self.close_telemetry();
        note_teardown_failure(policy, &mut failures, logger_closed)?;

        self.phase = Phase::Stopped;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(HostError::Teardown { failures })
        }
    }

    fn expect_phase(
        &self,
        operation: &'static str,
        expected: Phase,
    ) -> Result<(), PhaseOrderError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(PhaseOrderError {
                operation,
                expected,
                actual: self.phase,
            })
        }
    }

    fn enable_plugins(&mut self) -> Result<(), HostError> {
        let Some(plugins) = self.plugins.as_mut() else {
            return Err(missing_subsystem("plugins"));
        };
        let mut wiring =
            FacetWiring::new(self.api_server.as_mut(), self.daemon_server.as_mut());
        plugins.enable(&mut wiring)?;
        Ok(())
    }

    fn disable_plugins(&mut self) -> Result<(), HostError> {
        let Some(plugins) = self.plugins.as_mut() else {
            return Ok(());
        };
        let mut wiring =
            FacetWiring::new(self.api_server.as_mut(), self.daemon_server.as_mut());
        plugins.disable(&mut wiring)?;
        Ok(())
    }

    fn close_database(&mut self) -> Result<(), HostError> {
        match self.database.as_deref_mut() {
            Some(database) => database.close().map_err(HostError::from),
            None => Ok(()),
        }
    }

    fn close_telemetry(&self) -> Result<(), HostError> {
        match self.telemetry.as_ref() {
            Some(handle) => handle
                .close()
                .map_err(|source| HostError::Telemetry { source }),
            None => Ok(()),
        }
    }
}

fn missing_subsystem(subsystem: &'static str) -> HostError {
    HostError::Subsystem(SubsystemError::new(
        subsystem,
        "access",
        "subsystem is not wired",
    ))
}

fn note_teardown_failure(
    policy: TeardownPolicy,
    failures: &mut Vec<HostError>,
    result: Result<(), HostError>,
) -> Result<(), HostError> {
    match result {
        Ok(()) => Ok(()),
        Err(failure) => {
            // Record the failure through the logger before deciding whether
            // the remaining teardown steps run.
            error!(target: CORE_TARGET, error = %failure, "teardown step failed");
            match policy {
                TeardownPolicy::FailFast => Err(failure),
                TeardownPolicy::BestEffort => {
                    failures.push(failure);
                    Ok(())
                }
            }
        }
    }
}

fn open_json_database(
    settings: &berth_config::DatabaseSettings,
    root: &Utf8Path,
) -> Result<Box<dyn Database>, SubsystemError> {
    Ok(Box::new(JsonDatabase::new(paths::resolve(
        root,
        settings.path(),
    ))))
}

#[cfg(test)]
mod tests;
