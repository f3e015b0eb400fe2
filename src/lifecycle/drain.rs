//! Bounded pool release.
//!
//! # Responsibilities
//! - Release the acceptor and worker pools after the socket is closed
//! - Bound the wait: liveness of process shutdown beats finishing every
//!   in-flight connection
//! - Stay idempotent so overlapping cleanup paths (exit hooks, drop guards)
//!   cannot double-release

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::pool::TaskPool;

/// Drains the server's pools exactly once.
///
/// `release` may be called any number of times from any number of tasks;
/// only the first call does work. A pool that fails to quiesce within the
/// timeout is abandoned and the failure logged, never surfaced as an error.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    released: AtomicBool,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            released: AtomicBool::new(false),
        }
    }

    /// Whether the pools have already been released.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Release both pools, waiting up to `timeout` for each to quiesce.
    pub async fn release(&self, acceptors: &TaskPool, workers: &TaskPool, timeout: Duration) {
        if self.released.swap(true, Ordering::AcqRel) {
            tracing::debug!("Pools already released, release is a no-op");
            return;
        }

        acceptors.drain(timeout).await;
        workers.drain(timeout).await;
        tracing::info!("Server pools released");
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn release_is_idempotent() {
        let coordinator = ShutdownCoordinator::new();
        let acceptors = TaskPool::new("acceptor");
        let workers = TaskPool::new("worker");

        coordinator
            .release(&acceptors, &workers, Duration::from_millis(50))
            .await;
        assert!(coordinator.is_released());
        assert!(acceptors.is_closed());
        assert!(workers.is_closed());

        // Second call must not error or hang.
        coordinator
            .release(&acceptors, &workers, Duration::from_millis(50))
            .await;
        assert!(coordinator.is_released());
    }

    #[tokio::test]
    async fn release_with_zero_timeout_completes() {
        let coordinator = ShutdownCoordinator::new();
        let acceptors = TaskPool::new("acceptor");
        let workers = TaskPool::new("worker");
        workers.spawn(async {
            std::future::pending::<()>().await;
        });

        coordinator
            .release(&acceptors, &workers, Duration::ZERO)
            .await;
        assert!(workers.is_closed());
    }
}
