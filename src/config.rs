//! Server configuration.
//!
//! This module defines the socket and shutdown options the lifecycle
//! controller consumes. All types derive Serde traits for deserialization
//! from config files; the hosting process owns where the file comes from.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Socket and shutdown options for an [`RpcServer`](crate::RpcServer).
///
/// Captured once at construction; the server never re-reads it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listening port. `0` asks the OS for an ephemeral port.
    pub port: u16,

    /// Pending-connection queue depth passed to `listen(2)`.
    pub so_backlog: u32,

    /// Enable TCP keep-alive probes on accepted connections.
    pub so_keepalive: bool,

    /// Disable Nagle buffering on accepted connections.
    pub tcp_nodelay: bool,

    /// Upper bound, per pool, on how long `close()` waits for in-flight
    /// work before abandoning it.
    pub drain_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 0,
            so_backlog: 128,
            so_keepalive: false,
            tcp_nodelay: true,
            drain_timeout_ms: 15_000,
        }
    }
}

impl ServerConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the socket layer depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.so_backlog == 0 {
            return Err(ConfigError::Validation(
                "so_backlog must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Drain bound as a [`Duration`].
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.so_backlog, 128);
        assert_eq!(config.drain_timeout(), Duration::from_millis(15_000));
    }

    #[test]
    fn parses_partial_toml() {
        let config: ServerConfig =
            toml::from_str("port = 9000\nso_keepalive = true").unwrap();
        assert_eq!(config.port, 9000);
        assert!(config.so_keepalive);
        // Unspecified fields fall back to defaults.
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn rejects_zero_backlog() {
        let config = ServerConfig {
            so_backlog: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
