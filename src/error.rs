//! Error types for lifecycle operations.
//!
//! Every variant maps to exactly one failed precondition, so callers can
//! branch on "never started" vs "already stopped" instead of matching on a
//! generic failure.

use thiserror::Error;

/// Errors surfaced by [`RpcServer`](crate::RpcServer) operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// `start()` was called more than once.
    #[error("server already started")]
    AlreadyStarted,

    /// `shutdown()` was called before the server reached `Started`.
    #[error("server is not running")]
    NotRunning,

    /// `shutdown()` was called after the server already reached `Shutdown`.
    #[error("server is already shut down")]
    AlreadyShutdown,

    /// `wait_until_shutdown()` was called before the server reached `Started`.
    #[error("server not started yet")]
    NotStarted,

    /// The listening socket could not be created (port in use, permission
    /// denied, ...).
    #[error("failed to bind listener: {0}")]
    Bind(#[source] std::io::Error),
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Validation(String),
}
