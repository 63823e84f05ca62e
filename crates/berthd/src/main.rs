//! Entry point for the Berth host daemon.
//!
//! A thin bootstrap around the [`Supervisor`]: resolve the host root,
//! initialise and start the core, then block until a termination signal
//! asks for an orderly stop.

use std::process::ExitCode;

use camino::Utf8PathBuf;
use tracing::error;

use berthd::{HostError, ShutdownSignal, Supervisor, SystemShutdownSignal};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // The logger may already be up; give the failure a chance to
            // reach the log file before exiting.
            error!(error = %error, "host terminated with an error");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), HostError> {
    let root = host_root()?;
    let mut supervisor = Supervisor::system(root);

    supervisor.initialize()?;
    supervisor.start()?;

    let reason = SystemShutdownSignal
        .wait()
        .unwrap_or_else(|error| error.to_string());
    supervisor.stop(&reason)
}

fn host_root() -> Result<Utf8PathBuf, HostError> {
    let current = std::env::current_dir().map_err(|source| {
        HostError::Subsystem(berthd::SubsystemError::with_source("core", "resolve root", source))
    })?;
    Utf8PathBuf::from_path_buf(current).map_err(|path| {
        HostError::Subsystem(berthd::SubsystemError::new(
            "core",
            "resolve root",
            format!("host root '{}' is not valid UTF-8", path.display()),
        ))
    })
}
