//! Event-loop pools.
//!
//! # Responsibilities
//! - Spawn accept-loop and per-connection tasks onto the runtime
//! - Track how many tasks are still live
//! - Drain with a bounded wait, abandoning stragglers at the deadline
//!
//! A [`TaskPool`] is a named set of tokio tasks. The live count lives in a
//! watch channel so a drain can wait for zero without polling, and each task
//! keeps an abort handle registered so a timed-out drain can reclaim it.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::AbortHandle;

/// A pool of spawned tasks that can be drained with a bounded wait.
#[derive(Debug)]
pub struct TaskPool {
    /// Pool name for log lines ("acceptor", "worker").
    name: &'static str,
    /// Live-task count. Guards decrement it on drop, so the count stays
    /// accurate even when a task panics or is aborted.
    live: watch::Sender<usize>,
    /// Abort handles for tasks still registered with the pool.
    handles: Mutex<Vec<AbortHandle>>,
    /// Once closed, the pool rejects new work.
    closed: AtomicBool,
}

impl TaskPool {
    /// Create an empty, open pool.
    pub fn new(name: &'static str) -> Self {
        let (live, _) = watch::channel(0);
        Self {
            name,
            live,
            handles: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Spawn a task onto the pool.
    ///
    /// Returns `false` without spawning if the pool is already closed.
    pub fn spawn<F>(&self, future: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            tracing::debug!(pool = self.name, "Spawn rejected, pool closed");
            return false;
        }

        self.live.send_modify(|n| *n += 1);
        let guard = LiveGuard {
            live: self.live.clone(),
        };
        let handle = tokio::spawn(async move {
            let _guard = guard;
            future.await;
        });

        let mut handles = self.handles.lock().expect("task pool lock poisoned");
        handles.retain(|h| !h.is_finished());
        handles.push(handle.abort_handle());
        true
    }

    /// Number of tasks still live.
    pub fn live_tasks(&self) -> usize {
        *self.live.borrow()
    }

    /// Whether the pool has stopped accepting work.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close the pool and wait up to `timeout` for live tasks to finish.
    ///
    /// Tasks still live at the deadline are aborted; that is logged, never an
    /// error. A zero timeout reclaims immediately. Draining an already-closed
    /// pool is a no-op.
    pub async fn drain(&self, timeout: Duration) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        tracing::debug!(
            pool = self.name,
            live_tasks = self.live_tasks(),
            timeout_ms = timeout.as_millis() as u64,
            "Draining pool"
        );

        let mut rx = self.live.subscribe();
        let quiesced = if timeout.is_zero() {
            self.live_tasks() == 0
        } else {
            // wait_for re-reads the live value first, so a count that hit
            // zero before this call is observed immediately.
            tokio::time::timeout(timeout, rx.wait_for(|n| *n == 0))
                .await
                .is_ok()
        };

        if !quiesced {
            let handles = std::mem::take(
                &mut *self.handles.lock().expect("task pool lock poisoned"),
            );
            let abandoned = handles.iter().filter(|h| !h.is_finished()).count();
            for handle in handles {
                handle.abort();
            }
            tracing::warn!(
                pool = self.name,
                abandoned,
                "Pool did not quiesce within timeout, in-flight tasks aborted"
            );
        } else {
            tracing::debug!(pool = self.name, "Pool drained");
        }
    }
}

/// Decrements the pool's live count when the task finishes, panics, or is
/// aborted.
#[derive(Debug)]
struct LiveGuard {
    live: watch::Sender<usize>,
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.live.send_modify(|n| *n -= 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_live_tasks() {
        let pool = TaskPool::new("test");
        assert_eq!(pool.live_tasks(), 0);

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        assert!(pool.spawn(async move {
            let _ = rx.await;
        }));
        assert_eq!(pool.live_tasks(), 1);

        tx.send(()).unwrap();
        // The guard drops once the task runs to completion.
        tokio::time::timeout(Duration::from_secs(1), async {
            while pool.live_tasks() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn drain_waits_for_completion() {
        let pool = TaskPool::new("test");
        pool.spawn(async {
            tokio::time::sleep(Duration::from_millis(20)).await;
        });

        pool.drain(Duration::from_secs(5)).await;
        assert_eq!(pool.live_tasks(), 0);
        assert!(pool.is_closed());
    }

    #[tokio::test]
    async fn drain_aborts_at_deadline() {
        let pool = TaskPool::new("test");
        pool.spawn(async {
            // Never completes on its own.
            std::future::pending::<()>().await;
        });

        pool.drain(Duration::from_millis(20)).await;
        assert!(pool.is_closed());
        // The aborted task's guard drops shortly after the abort lands.
        tokio::time::timeout(Duration::from_secs(1), async {
            while pool.live_tasks() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn zero_timeout_drain_does_not_hang() {
        let pool = TaskPool::new("test");
        pool.spawn(async {
            std::future::pending::<()>().await;
        });

        pool.drain(Duration::ZERO).await;
        assert!(pool.is_closed());
    }

    #[tokio::test]
    async fn closed_pool_rejects_spawn() {
        let pool = TaskPool::new("test");
        pool.drain(Duration::ZERO).await;
        assert!(!pool.spawn(async {}));
        assert_eq!(pool.live_tasks(), 0);
    }
}
