//! Lifecycle controller for long-running RPC server processes.
//!
//! Owns the listening socket, the acceptor and worker pools behind it, and a
//! strict `Created → Starting → Started → Shutdown` state machine making
//! start-up, readiness and graceful shutdown safe under concurrent
//! invocation. Framing, routing and per-connection processing are supplied
//! by the caller through a [`PipelineFactory`]; this crate only wires them
//! onto accepted connections.
//!
//! ```no_run
//! use quayside::{RpcServer, ServerConfig};
//! use tokio::io::{AsyncReadExt, AsyncWriteExt};
//!
//! # async fn run() -> Result<(), quayside::ServerError> {
//! let server = RpcServer::new(ServerConfig::default(), |conn: quayside::Connection| async move {
//!     let mut stream = conn.into_stream();
//!     let mut buf = [0u8; 1024];
//!     while let Ok(n) = stream.read(&mut buf).await {
//!         if n == 0 || stream.write_all(&buf[..n]).await.is_err() {
//!             break;
//!         }
//!     }
//! });
//! let addr = server.start().await?;
//! tracing::info!(%addr, "serving");
//! server.wait_until_shutdown().await?;
//! server.close().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod net;
pub mod pipeline;
pub mod pool;
pub mod server;

pub use config::ServerConfig;
pub use error::{ConfigError, ServerError};
pub use lifecycle::{ServerState, ShutdownCoordinator};
pub use net::{Connection, ConnectionId};
pub use pipeline::PipelineFactory;
pub use pool::TaskPool;
pub use server::RpcServer;
