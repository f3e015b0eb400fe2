//! Listener binding and the accept loop.
//!
//! # Responsibilities
//! - Translate config (port, backlog, keep-alive, nodelay) into a bound,
//!   listening socket
//! - Accept incoming TCP connections on the acceptor pool
//! - Attach the caller-supplied pipeline to every accepted connection
//! - Fire the permanent close signal once the socket is dropped

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::watch;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::net::connection::Connection;
use crate::pipeline::PipelineFactory;
use crate::pool::TaskPool;

/// A bound, listening socket not yet driving an accept loop.
#[derive(Debug)]
pub struct BoundListener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl BoundListener {
    /// Bind a listening socket per the config's socket options.
    ///
    /// Fails with [`ServerError::Bind`] if the port is unavailable or the
    /// process lacks permission. Success means the socket is accepting: the
    /// OS queues connections from this point, before any accept loop runs.
    pub fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
        let socket = TcpSocket::new_v4().map_err(ServerError::Bind)?;
        socket.set_reuseaddr(true).map_err(ServerError::Bind)?;
        socket.bind(addr).map_err(ServerError::Bind)?;
        let inner = socket
            .listen(config.so_backlog)
            .map_err(ServerError::Bind)?;
        let local_addr = inner.local_addr().map_err(ServerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            so_backlog = config.so_backlog,
            so_keepalive = config.so_keepalive,
            tcp_nodelay = config.tcp_nodelay,
            "Listener bound"
        );

        Ok(Self { inner, local_addr })
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Run the accept loop until the stop signal fires.
    ///
    /// Each accepted stream gets the configured socket options, is wrapped in
    /// a [`Connection`], and the factory's pipeline for it is spawned on the
    /// worker pool. The listener socket is dropped before `closed` fires, so
    /// no observer of the close signal can see a live socket; the guard fires
    /// the signal even if this task is aborted mid-drain.
    pub async fn serve(
        self,
        config: ServerConfig,
        factory: Arc<dyn PipelineFactory>,
        workers: Arc<TaskPool>,
        mut stop: watch::Receiver<bool>,
        closed: watch::Sender<bool>,
    ) {
        let guard = CloseGuard {
            closed,
            local_addr: self.local_addr,
        };
        // Declared after the guard: on an abort the listener drops first,
        // then the guard fires the close signal.
        let listener = self.inner;
        loop {
            tokio::select! {
                // The wrapper block drops the watch::Ref inside its own
                // poll, keeping the serve future Send.
                _ = async { let _ = stop.wait_for(|stopped| *stopped).await; } => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr)) => {
                        configure_stream(&stream, &config);
                        let conn = Connection::new(stream, peer_addr);
                        tracing::debug!(
                            connection_id = %conn.id(),
                            peer_addr = %peer_addr,
                            "Connection accepted"
                        );
                        if !workers.spawn(factory.build_pipeline(conn)) {
                            // Worker pool already released; stop accepting.
                            break;
                        }
                    }
                    Err(error) => {
                        // Transient accept failures (EMFILE, resets in the
                        // backlog) must not kill the loop.
                        tracing::warn!(error = %error, "Accept failed");
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                },
            }
        }

        drop(listener);
        drop(guard);
    }
}

/// Fires the permanent close signal on drop.
///
/// The accept task may be torn down three ways: the stop signal, a rejected
/// worker spawn, or an abort from a timed-out pool drain. All of them must
/// release `shutdown()` and every waiter, so the signal lives in a drop
/// guard rather than on the normal exit path.
struct CloseGuard {
    closed: watch::Sender<bool>,
    local_addr: SocketAddr,
}

impl Drop for CloseGuard {
    fn drop(&mut self) {
        self.closed.send_replace(true);
        tracing::info!(address = %self.local_addr, "Listener closed");
    }
}

/// Apply per-connection socket options from the config.
fn configure_stream(stream: &TcpStream, config: &ServerConfig) {
    if let Err(error) = stream.set_nodelay(config.tcp_nodelay) {
        tracing::warn!(error = %error, "Failed to set TCP_NODELAY");
    }
    // Tokio exposes no keep-alive setter on accepted streams; go through
    // socket2 without taking ownership of the fd.
    if let Err(error) = socket2::SockRef::from(stream).set_keepalive(config.so_keepalive) {
        tracing::warn!(error = %error, "Failed to set SO_KEEPALIVE");
    }
}
