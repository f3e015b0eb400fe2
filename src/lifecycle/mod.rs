//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (server.rs):
//!     CAS Created → Starting → bind listener → store Started
//!
//! Shutdown (server.rs + drain.rs):
//!     CAS Started → Shutdown → stop accepting → close socket → drain pools
//!
//! State (state.rs):
//!     Created → Starting → Started → Shutdown (terminal, no revisits)
//! ```
//!
//! # Design Decisions
//! - One atomic state cell is the single source of truth for who may act
//! - Every mutating operation gates on a successful compare-and-swap
//! - Pool drain has a timeout: in-flight work is abandoned after the deadline

pub mod drain;
pub mod state;

pub use drain::ShutdownCoordinator;
pub use state::{ServerState, StateCell};
