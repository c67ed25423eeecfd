// Configuration module entry point
// Builds the immutable server configuration and runtime state

mod state;
mod types;

use std::net::SocketAddr;

use crate::error::ServerError;

// Re-export public types
pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, ServerConfig};

/// Port the server listens on
pub const DEFAULT_PORT: u16 = 3001;

impl Config {
    /// Build the configuration from built-in defaults.
    ///
    /// The server takes no flags, reads no file and consumes no environment
    /// variables, so defaults are the only source.
    pub fn load() -> Result<Self, ServerError> {
        let settings = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "common")?
            .set_default("http.keep_alive", true)?
            .set_default("http.read_chunk_size", 65_536)?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|source| ServerError::Address { addr, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::load().unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 3001);
        assert_eq!(cfg.server.workers, None);
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "common");
        assert!(cfg.http.keep_alive);
        assert_eq!(cfg.http.read_chunk_size, 65_536);
    }

    #[test]
    fn test_socket_addr_all_interfaces() {
        let cfg = Config::load().unwrap();
        let addr = cfg.socket_addr().unwrap();
        assert!(addr.ip().is_unspecified());
        assert_eq!(addr.port(), DEFAULT_PORT);
    }

    #[test]
    fn test_socket_addr_invalid_host() {
        let mut cfg = Config::load().unwrap();
        cfg.server.host = "not a host".to_string();
        assert!(matches!(
            cfg.socket_addr(),
            Err(ServerError::Address { .. })
        ));
    }

    #[test]
    fn test_state_rejects_missing_root() {
        let cfg = Config::load().unwrap();
        let missing = std::env::temp_dir().join("nocache-server-no-such-root-dir");
        assert!(matches!(
            AppState::new(cfg, &missing),
            Err(ServerError::Root { .. })
        ));
    }

    #[test]
    fn test_state_canonicalizes_root() {
        let cfg = Config::load().unwrap();
        let dir = std::env::temp_dir();
        let state = AppState::new(cfg, &dir.join(".")).unwrap();
        assert_eq!(state.root, dir.canonicalize().unwrap());
    }
}
