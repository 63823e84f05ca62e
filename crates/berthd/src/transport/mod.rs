//! TCP transport shared by the API and daemon servers.
//!
//! Wire protocols are the concern of whatever sits behind a
//! [`ConnectionHandler`]; this module only provides the lifecycle the
//! supervisor drives — prepare, claim path segments, bind, accept on a
//! background thread, shut down.

mod listener;

use std::collections::BTreeSet;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::subsystems::{PortServer, SubsystemError};

use self::listener::{ListenerHandle, TcpAcceptor};

pub(crate) const TRANSPORT_TARGET: &str = "berth::transport";

/// Handles one accepted connection.
///
/// Handlers run on the listener's accept thread and must not block it for
/// long; the system handler only records the peer before dropping the
/// stream, since request routing is out of the supervisor's hands.
pub trait ConnectionHandler: Send + Sync {
    /// Processes one accepted stream.
    fn handle(&self, stream: TcpStream, peer: SocketAddr);
}

/// Handler that records the connection and drops it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ConnectionHandler for LoggingHandler {
    fn handle(&self, stream: TcpStream, peer: SocketAddr) {
        trace!(target: TRANSPORT_TARGET, %peer, "connection accepted");
        drop(stream);
    }
}

/// A TCP server the supervisor owns for one role (API or daemon).
///
/// Between `initialize` and `start`, subsystems claim path segments via
/// [`PortServer::mount`]; `start` binds the configured port and spawns the
/// accept loop, and `close` stops the loop and joins its thread.
pub struct NetServer {
    name: &'static str,
    handler: Arc<dyn ConnectionHandler>,
    segments: BTreeSet<String>,
    listener: Option<ListenerHandle>,
}

impl std::fmt::Debug for NetServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetServer")
            .field("name", &self.name)
            .field("segments", &self.segments)
            .field("listening", &self.listener.is_some())
            .finish()
    }
}

impl NetServer {
    /// Creates a server with the default logging handler.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self::with_handler(name, Arc::new(LoggingHandler))
    }

    /// Creates a server with a custom connection handler.
    #[must_use]
    pub fn with_handler(name: &'static str, handler: Arc<dyn ConnectionHandler>) -> Self {
        Self {
            name,
            handler,
            segments: BTreeSet::new(),
            listener: None,
        }
    }

    /// Role name of this server.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Path segments currently claimed on this server.
    #[must_use]
    pub const fn segments(&self) -> &BTreeSet<String> {
        &self.segments
    }

    #[cfg(test)]
    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(ListenerHandle::local_addr)
    }
}

impl PortServer for NetServer {
    fn initialize(&mut self) -> Result<(), SubsystemError> {
        if self.listener.is_some() {
            return Err(SubsystemError::new(
                self.name,
                "initialize",
                "server is already listening",
            ));
        }
        debug!(target: TRANSPORT_TARGET, server = self.name, "server prepared");
        Ok(())
    }

    fn mount(&mut self, segment: &str) -> Result<(), SubsystemError> {
        if self.segments.insert(segment.to_owned()) {
            debug!(target: TRANSPORT_TARGET, server = self.name, segment, "segment mounted");
        }
        Ok(())
    }

    fn unmount(&mut self, segment: &str) -> Result<(), SubsystemError> {
        if self.segments.remove(segment) {
            debug!(target: TRANSPORT_TARGET, server = self.name, segment, "segment unmounted");
        }
        Ok(())
    }

    fn start(&mut self, port: u16) -> Result<(), SubsystemError> {
        if self.listener.is_some() {
            return Err(SubsystemError::new(
                self.name,
                "start",
                "server is already listening",
            ));
        }
        let acceptor = TcpAcceptor::bind(port)
            .map_err(|source| SubsystemError::with_source(self.name, "start", source))?;
        let handle = acceptor
            .start(self.name, Arc::clone(&self.handler))
            .map_err(|source| SubsystemError::with_source(self.name, "start", source))?;
        self.listener = Some(handle);
        Ok(())
    }

    fn close(&mut self) -> Result<(), SubsystemError> {
        let Some(handle) = self.listener.take() else {
            return Ok(());
        };
        handle.shutdown();
        handle
            .join()
            .map_err(|source| SubsystemError::with_source(self.name, "close", source))
    }
}
