//! The Berth host daemon.
//!
//! `berthd` boots a fixed set of interdependent subsystems — configuration,
//! logging, the panel-facing API server, the machine-facing daemon server, a
//! pluggable database, the user directory, the daemon directory, and the
//! plugin registry — and tears them down again in an orderly fashion.
//!
//! The heart of the crate is the [`Supervisor`]: it owns every subsystem
//! handle for the process lifetime and drives three ordered, fail-fast
//! phases. `initialize` loads configuration and wires each subsystem with
//! the narrow dependencies it needs; `start` brings the stateful subsystems
//! online and enables loaded plugins; `stop` reverses into shutdown, by
//! default attempting every teardown step and aggregating failures.
//!
//! Subsystem collaborators sit behind traits ([`PortServer`], [`Database`],
//! [`UserSubsystem`], [`DaemonSubsystem`]) so the supervisor can be
//! exercised against recording fakes while the binary wires the system
//! implementations in this crate.

pub mod activation;
pub mod daemons;
pub mod database;
mod paths;
pub mod shutdown;
pub mod subsystems;
pub mod supervisor;
pub mod telemetry;
pub mod transport;
pub mod users;

pub use self::activation::FacetWiring;
pub use self::daemons::DaemonDirectory;
pub use self::database::{Database, DatabaseConstructor, DatabaseTypeRegistry, JsonDatabase};
pub use self::shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};
pub use self::subsystems::{DaemonSubsystem, PortServer, SubsystemError, UserSubsystem};
pub use self::supervisor::{
    HostError, Phase, PhaseOrderError, Subsystems, Supervisor, TeardownPolicy,
};
pub use self::telemetry::{TelemetryError, TelemetryHandle};
pub use self::transport::{ConnectionHandler, LoggingHandler, NetServer};
pub use self::users::UserDirectory;
