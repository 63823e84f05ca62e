//! Shutdown notification for the host binary.

use std::io;

use signal_hook::consts::signal::{SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

const SHUTDOWN_TARGET: &str = "berth::shutdown";

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal {
    /// Blocks until shutdown should proceed, returning the reason.
    ///
    /// # Errors
    ///
    /// Returns a [`ShutdownError`] when the notification mechanism cannot
    /// be installed.
    fn wait(&self) -> Result<String, ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Shutdown listener that waits for termination signals.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<String, ShutdownError> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT])
            .map_err(|source| ShutdownError::Install { source })?;
        let reason = signals
            .forever()
            .next()
            .map_or_else(|| String::from("signal"), signal_name);
        info!(target: SHUTDOWN_TARGET, reason = reason.as_str(), "shutdown signal received");
        Ok(reason)
    }
}

fn signal_name(signal: i32) -> String {
    match signal {
        SIGTERM => String::from("SIGTERM"),
        SIGINT => String::from("SIGINT"),
        SIGQUIT => String::from("SIGQUIT"),
        other => format!("signal {other}"),
    }
}
