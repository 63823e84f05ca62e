//! Structured telemetry for the host, written to a root-relative log file.
//!
//! The subscriber is installed once behind a process-wide guard; repeated
//! initialisation returns a fresh handle to the existing sink without
//! touching the global state again. The handle flushes the sink on close
//! so the recorded shutdown reason reaches the file before the process
//! exits.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use berth_config::LogLevel;
use camino::{Utf8Path, Utf8PathBuf};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

static LOG_SINK: OnceCell<FileSink> = OnceCell::new();

/// Clone-able writer over the shared log file.
#[derive(Debug, Clone)]
struct FileSink {
    file: Arc<Mutex<File>>,
}

impl FileSink {
    fn flush_sink(&self) -> io::Result<()> {
        self.file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_sink()
    }
}

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Clone)]
pub struct TelemetryHandle {
    sink: FileSink,
}

impl TelemetryHandle {
    /// Flushes buffered log output to the file.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Flush`] when the sink cannot be flushed.
    pub fn close(&self) -> Result<(), TelemetryError> {
        self.sink
            .flush_sink()
            .map_err(|source| TelemetryError::Flush { source })
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log directory could not be created.
    #[error("failed to prepare log directory '{path}': {source}")]
    Directory {
        /// Directory that was being created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The log file could not be opened.
    #[error("failed to open log file '{path}': {source}")]
    OpenLog {
        /// File that was being opened.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The level filter expression was rejected.
    #[error("invalid log filter: {0}")]
    Filter(String),

    /// The global tracing subscriber could not be installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),

    /// The log sink could not be flushed.
    #[error("failed to flush log sink: {source}")]
    Flush {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Installs the file-backed tracing subscriber on first invocation.
///
/// `directory` is created when absent and receives one `<name>.log` file in
/// append mode. The configured level becomes the subscriber's filter.
///
/// # Errors
///
/// Returns a [`TelemetryError`] when the directory or file cannot be
/// prepared or the subscriber cannot be installed.
pub fn initialise(
    directory: &Utf8Path,
    name: &str,
    level: LogLevel,
) -> Result<TelemetryHandle, TelemetryError> {
    let sink = LOG_SINK.get_or_try_init(|| install_subscriber(directory, name, level))?;
    Ok(TelemetryHandle { sink: sink.clone() })
}

fn install_subscriber(
    directory: &Utf8Path,
    name: &str,
    level: LogLevel,
) -> Result<FileSink, TelemetryError> {
    fs::create_dir_all(directory).map_err(|source| TelemetryError::Directory {
        path: directory.to_owned(),
        source,
    })?;

    let path = directory.join(format!("{name}.log"));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| TelemetryError::OpenLog { path, source })?;
    let sink = FileSink {
        file: Arc::new(Mutex::new(file)),
    };

    let filter = EnvFilter::try_new(level.filter_directive())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let writer_sink = sink.clone();
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        // Log files are not terminals; colour codes would only corrupt them.
        .with_ansi(false)
        .with_writer(move || writer_sink.clone())
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .finish();

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)?;
    Ok(sink)
}
