//! The server handle and its lifecycle operations.
//!
//! # Responsibilities
//! - Own the state cell, both event-loop pools, and the listening socket
//! - Gate every mutating operation on a compare-and-swap of the state cell
//! - Publish the permanent close signal that releases `shutdown()` and all
//!   `wait_until_shutdown()` callers
//!
//! # Design Decisions
//! - No lock is held across bind or close; the atomic state cell alone
//!   decides who may act
//! - `shutdown()` closes the socket only; pool release lives in `close()`
//!   so cleanup paths can run it independently and repeatedly
//! - A failed bind moves the state to `Shutdown` so callers are never left
//!   wedged in `Starting`

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use tokio::sync::watch;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::lifecycle::{ServerState, ShutdownCoordinator, StateCell};
use crate::net::listener::BoundListener;
use crate::pipeline::PipelineFactory;
use crate::pool::TaskPool;

/// Lifecycle controller for one RPC server process.
///
/// Created once, mutated only through [`start`](Self::start),
/// [`shutdown`](Self::shutdown), [`wait_until_shutdown`](Self::wait_until_shutdown)
/// and [`close`](Self::close), and discarded after shutdown. All operations
/// take `&self` and are safe to invoke concurrently from arbitrary tasks;
/// wrap the handle in an [`Arc`] to share it.
pub struct RpcServer {
    config: ServerConfig,
    factory: Arc<dyn PipelineFactory>,
    state: StateCell,
    /// Runs the accept loop.
    acceptors: Arc<TaskPool>,
    /// Runs per-connection pipelines.
    workers: Arc<TaskPool>,
    coordinator: ShutdownCoordinator,
    /// Tells the accept loop to stop. Fired by `shutdown()` and `close()`.
    stop: watch::Sender<bool>,
    /// Permanent closure, fired exactly once after the listener socket is
    /// dropped. Safe to await before or after it fires; broadcast to all
    /// waiters.
    closed: watch::Sender<bool>,
    local_addr: OnceLock<SocketAddr>,
}

impl RpcServer {
    /// Create a handle in the `Created` state. Nothing is bound yet.
    pub fn new<F>(config: ServerConfig, factory: F) -> Self
    where
        F: PipelineFactory,
    {
        let (stop, _) = watch::channel(false);
        let (closed, _) = watch::channel(false);
        Self {
            config,
            factory: Arc::new(factory),
            state: StateCell::new(),
            acceptors: Arc::new(TaskPool::new("acceptor")),
            workers: Arc::new(TaskPool::new("worker")),
            coordinator: ShutdownCoordinator::new(),
            stop,
            closed,
            local_addr: OnceLock::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServerState {
        self.state.load()
    }

    /// The bound address, once the server has started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Bind the listener and begin accepting connections.
    ///
    /// Must be called exactly once; any call that does not win the
    /// `Created → Starting` transition fails with
    /// [`ServerError::AlreadyStarted`] without attempting a second bind.
    /// Returns the bound address; when this future resolves the socket is
    /// live and accepting.
    pub async fn start(&self) -> Result<SocketAddr, ServerError> {
        if self
            .state
            .transition(ServerState::Created, ServerState::Starting)
            .is_err()
        {
            return Err(ServerError::AlreadyStarted);
        }

        // Only the transition winner reaches this point.
        let listener = match BoundListener::bind(&self.config) {
            Ok(listener) => listener,
            Err(error) => {
                // Terminal rather than wedged-in-Starting: close() still
                // works, retries go through a fresh handle.
                self.state.store(ServerState::Shutdown);
                self.closed.send_replace(true);
                tracing::error!(port = self.config.port, error = %error, "Bind failed");
                return Err(error);
            }
        };

        let local_addr = listener.local_addr();
        let _ = self.local_addr.set(local_addr);

        let serve = listener.serve(
            self.config.clone(),
            Arc::clone(&self.factory),
            Arc::clone(&self.workers),
            self.stop.subscribe(),
            self.closed.clone(),
        );
        if !self.acceptors.spawn(serve) {
            // close() already released the pools; the rejected serve future
            // was dropped, taking the socket with it.
            self.state.store(ServerState::Shutdown);
            self.closed.send_replace(true);
            return Err(ServerError::Bind(std::io::Error::new(
                std::io::ErrorKind::Other,
                "acceptor pool already released",
            )));
        }

        // Plain store: no second CAS needed, no other caller can be in
        // Starting.
        self.state.store(ServerState::Started);
        tracing::info!(address = %local_addr, "Server started");
        Ok(local_addr)
    }

    /// Close the listening socket.
    ///
    /// Only legal from `Started`. The winner of the `Started → Shutdown`
    /// transition stops the accept loop and waits until the socket is
    /// actually closed before returning; losers observe
    /// [`ServerError::AlreadyShutdown`] (or [`ServerError::NotRunning`] if
    /// the server never reached `Started`) and touch nothing.
    pub async fn shutdown(&self) -> Result<(), ServerError> {
        if let Err(observed) = self
            .state
            .transition(ServerState::Started, ServerState::Shutdown)
        {
            // Classified from the CAS-observed value, not a second load a
            // racing transition could have moved.
            return Err(match observed {
                ServerState::Shutdown => ServerError::AlreadyShutdown,
                _ => ServerError::NotRunning,
            });
        }

        self.stop.send_replace(true);
        let mut closed = self.closed.subscribe();
        closed
            .wait_for(|closed| *closed)
            .await
            .expect("close signal sender dropped while server handle alive");
        tracing::info!("Server shut down");
        Ok(())
    }

    /// Block until the listening socket has been closed.
    ///
    /// Waiting before `start()` is a usage error
    /// ([`ServerError::NotStarted`]). From `Started` this awaits the close
    /// signal, a permanent closure: the wait is race-free against a
    /// concurrent `shutdown()` and any number of callers are released
    /// together. After shutdown it returns immediately.
    pub async fn wait_until_shutdown(&self) -> Result<(), ServerError> {
        match self.state.load() {
            ServerState::Created | ServerState::Starting => Err(ServerError::NotStarted),
            ServerState::Started => {
                let mut closed = self.closed.subscribe();
                closed
                    .wait_for(|closed| *closed)
                    .await
                    .expect("close signal sender dropped while server handle alive");
                Ok(())
            }
            ServerState::Shutdown => Ok(()),
        }
    }

    /// `start()` then `wait_until_shutdown()`.
    pub async fn start_and_wait(&self) -> Result<(), ServerError> {
        self.start().await?;
        self.wait_until_shutdown().await
    }

    /// Release the acceptor and worker pools with a bounded wait.
    ///
    /// For cleanup paths (exit hooks): safe to call in any state, any number
    /// of times, whether or not `shutdown()` ever ran. Pools that fail to
    /// quiesce within `drain_timeout_ms` are abandoned; that is logged, not
    /// an error.
    pub async fn close(&self) {
        // Harmless if the accept loop already stopped or never ran.
        self.stop.send_replace(true);
        self.coordinator
            .release(&self.acceptors, &self.workers, self.config.drain_timeout())
            .await;
    }
}

impl std::fmt::Debug for RpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcServer")
            .field("state", &self.state.load())
            .field("local_addr", &self.local_addr.get())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
