//! Accepted-connection hand-off.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Bundle an accepted stream with its metadata for the pipeline factory

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::TcpStream;

/// Process-wide counter behind [`ConnectionId::new`]. Relaxed ordering:
/// uniqueness is the only requirement.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an accepted connection, used in log fields to
/// correlate a pipeline's lifetime with its accept event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// An accepted connection, handed to the pipeline factory exactly once.
///
/// Socket options from the server config (nodelay, keep-alive) are already
/// applied by the time the factory sees it.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    peer_addr: SocketAddr,
    stream: TcpStream,
}

impl Connection {
    pub(crate) fn new(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        Self {
            id: ConnectionId::new(),
            peer_addr,
            stream,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Borrow the underlying stream.
    pub fn stream(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Take ownership of the underlying stream, e.g. to split it across
    /// read/write halves of a pipeline.
    pub fn into_stream(self) -> TcpStream {
        self.stream
    }
}
