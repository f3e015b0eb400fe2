//! Server state machine.
//!
//! # Responsibilities
//! - Define the four lifecycle states
//! - Provide atomic compare-and-swap transitions between them
//!
//! The cell is the single source of truth for "who may act next": no socket
//! or pool is touched except by the caller that won the relevant transition.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of the server.
///
/// States progress strictly along
/// `Created → Starting → Started → Shutdown`; `Shutdown` is terminal and no
/// state is ever revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerState {
    /// Initial state; no socket bound.
    Created = 0,
    /// Transient state; the listener bind is in flight.
    Starting = 1,
    /// Socket bound and accepting connections.
    Started = 2,
    /// Terminal state; socket closed.
    Shutdown = 3,
}

impl ServerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ServerState::Created,
            1 => ServerState::Starting,
            2 => ServerState::Started,
            _ => ServerState::Shutdown,
        }
    }
}

impl std::fmt::Display for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ServerState::Created => "created",
            ServerState::Starting => "starting",
            ServerState::Started => "started",
            ServerState::Shutdown => "shutdown",
        };
        f.write_str(name)
    }
}

/// Atomically readable/settable [`ServerState`].
///
/// AcqRel ordering: a successful transition publishes everything the winner
/// did before it, and gates everything it does after.
#[derive(Debug)]
pub struct StateCell {
    state: AtomicU8,
}

impl StateCell {
    /// Create a cell in [`ServerState::Created`].
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ServerState::Created as u8),
        }
    }

    /// Current state.
    pub fn load(&self) -> ServerState {
        ServerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Attempt the edge `from → to`. The winner gets `Ok(())`; losers get
    /// the state observed by the failed compare-and-swap and must not act.
    /// Classifying errors from the returned value avoids re-reading a cell a
    /// racing transition may have moved again.
    pub fn transition(&self, from: ServerState, to: ServerState) -> Result<(), ServerState> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(ServerState::from_u8)
    }

    /// Unconditional store, for edges only the previous CAS winner can
    /// reach (`Starting → Started`, `Starting → Shutdown` on bind failure).
    pub fn store(&self, state: ServerState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_created() {
        let cell = StateCell::new();
        assert_eq!(cell.load(), ServerState::Created);
    }

    #[test]
    fn transition_wins_once() {
        let cell = StateCell::new();
        assert!(cell
            .transition(ServerState::Created, ServerState::Starting)
            .is_ok());
        assert!(cell
            .transition(ServerState::Created, ServerState::Starting)
            .is_err());
        assert_eq!(cell.load(), ServerState::Starting);
    }

    #[test]
    fn failed_transition_reports_observed_state() {
        let cell = StateCell::new();
        assert_eq!(
            cell.transition(ServerState::Started, ServerState::Shutdown),
            Err(ServerState::Created)
        );
        assert_eq!(cell.load(), ServerState::Created);
    }

    #[test]
    fn store_reaches_started() {
        let cell = StateCell::new();
        assert!(cell
            .transition(ServerState::Created, ServerState::Starting)
            .is_ok());
        cell.store(ServerState::Started);
        assert!(cell
            .transition(ServerState::Started, ServerState::Shutdown)
            .is_ok());
        assert_eq!(cell.load(), ServerState::Shutdown);
    }
}
