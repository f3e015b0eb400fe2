//! Shared helpers for lifecycle and serving tests.

use quayside::{Connection, RpcServer, ServerConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Install a test-writer subscriber so `RUST_LOG` works under `cargo test`.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quayside=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// An ephemeral-port config with a short drain bound for fast tests.
#[allow(dead_code)]
pub fn test_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        so_backlog: 128,
        so_keepalive: true,
        tcp_nodelay: true,
        drain_timeout_ms: 1_000,
    }
}

/// A server whose pipeline echoes every received byte back to the peer.
#[allow(dead_code)]
pub fn echo_server(config: ServerConfig) -> RpcServer {
    RpcServer::new(config, |conn: Connection| async move {
        let mut stream = conn.into_stream();
        let mut buf = [0u8; 4096];
        loop {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if stream.write_all(&buf[..n]).await.is_err() {
                        break;
                    }
                }
            }
        }
    })
}

/// A server whose pipeline ignores the connection entirely.
#[allow(dead_code)]
pub fn sink_server(config: ServerConfig) -> RpcServer {
    RpcServer::new(config, |conn: Connection| async move {
        drop(conn);
    })
}
