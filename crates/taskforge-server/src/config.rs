//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR` (full address) or `PORT` (port only).
    /// Default: `0.0.0.0:5000`
    pub http_addr: SocketAddr,

    /// Filesystem path of the SQLite database.
    /// Env: `DB_PATH`
    /// Default: `./taskforge.db`
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 5000).into(),
            db_path: PathBuf::from("./taskforge.db"),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        } else if let Ok(port) = std::env::var("PORT") {
            if let Ok(parsed) = port.parse::<u16>() {
                config.http_addr = ([0, 0, 0, 0], parsed).into();
            } else {
                tracing::warn!(value = %port, "Invalid PORT, using default");
            }
        }

        if let Ok(path) = std::env::var("DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, SocketAddr::from(([0, 0, 0, 0], 5000)));
        assert_eq!(config.db_path, PathBuf::from("./taskforge.db"));
    }
}
