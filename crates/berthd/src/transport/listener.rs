//! Background accept loop for a bound TCP listener.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use super::{ConnectionHandler, TRANSPORT_TARGET};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Errors raised while running the accept loop.
#[derive(Debug, Error)]
pub(crate) enum ListenerError {
    /// The listener could not be switched to non-blocking mode.
    #[error("failed to configure non-blocking accept: {source}")]
    NonBlocking {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The accept thread panicked before it could be joined.
    #[error("listener thread panicked")]
    ThreadPanic,
}

/// A bound listener not yet accepting connections.
#[derive(Debug)]
pub(crate) struct TcpAcceptor {
    listener: TcpListener,
}

impl TcpAcceptor {
    /// Binds all interfaces on `port`.
    pub(crate) fn bind(port: u16) -> io::Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))?;
        Ok(Self { listener })
    }

    /// Spawns the accept loop on a background thread.
    pub(crate) fn start(
        self,
        name: &'static str,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        self.listener
            .set_nonblocking(true)
            .map_err(|source| ListenerError::NonBlocking { source })?;

        let local_addr = self.listener.local_addr().ok();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);
        let listener = self.listener;
        let handle =
            thread::spawn(move || run_accept_loop(name, &listener, &shutdown_flag, &handler));

        info!(target: TRANSPORT_TARGET, server = name, ?local_addr, "listener started");
        Ok(ListenerHandle {
            local_addr,
            shutdown,
            handle: Some(handle),
        })
    }
}

/// Handle to the background listener thread.
#[derive(Debug)]
pub(crate) struct ListenerHandle {
    local_addr: Option<SocketAddr>,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        self.handle
            .take()
            .map_or(Ok(()), |handle| handle.join().map_err(|_| ListenerError::ThreadPanic))
    }

    #[cfg(test)]
    pub(crate) const fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn run_accept_loop(
    name: &'static str,
    listener: &TcpListener,
    shutdown: &AtomicBool,
    handler: &Arc<dyn ConnectionHandler>,
) {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            info!(target: TRANSPORT_TARGET, server = name, "listener stopping");
            return;
        }
        match listener.accept() {
            Ok((stream, peer)) => handler.handle(stream, peer),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_BACKOFF);
            }
            Err(error) => {
                warn!(target: TRANSPORT_TARGET, server = name, %error, "accept failed");
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }
}
