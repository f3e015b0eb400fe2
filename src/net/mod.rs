//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! start()
//!     → listener.rs (bind with SO_REUSEADDR + backlog)
//!     → accept loop on the acceptor pool
//!     → per accepted stream: apply TCP_NODELAY / SO_KEEPALIVE
//!     → connection.rs (ConnectionId + hand-off bundle)
//!     → pipeline factory output spawned on the worker pool
//!
//! shutdown()
//!     → stop signal breaks the accept loop
//!     → listener socket dropped
//!     → close signal fired (releases shutdown() and all waiters)
//! ```
//!
//! # Design Decisions
//! - The binder is a pure composition point: framing and routing live in the
//!   caller-supplied pipeline, never here
//! - Transient accept errors keep the loop alive; only the stop signal ends it
//! - The close signal fires strictly after the socket is dropped

pub mod connection;
pub mod listener;

pub use connection::{Connection, ConnectionId};
pub use listener::BoundListener;
