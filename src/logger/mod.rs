//! Logger module
//!
//! Provides logging utilities for the HTTP server including:
//! - Subscriber installation
//! - Server lifecycle logging
//! - Access logging in common or combined format

mod format;

pub use format::AccessLogEntry;

use crate::config::LoggingConfig;
use crate::error::ServerError;
use std::net::SocketAddr;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber
///
/// Should be called once at application startup. The filter comes from the
/// configuration only; `RUST_LOG` is not consulted.
pub fn init(config: &LoggingConfig) -> Result<(), ServerError> {
    let filter = EnvFilter::try_new(&config.level).map_err(|source| ServerError::LogFilter {
        directive: config.level.clone(),
        source,
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(ServerError::LoggerInstall)
}

pub fn log_server_start(addr: &SocketAddr, root: &Path) {
    tracing::info!("Server running on port {} with NO CACHE headers", addr.port());
    tracing::info!("Listening on: http://{addr}");
    tracing::info!("Serving files from: {}", root.display());
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!(peer = %peer_addr, "connection accepted");
}

pub fn log_connection_error(peer_addr: &SocketAddr, err: &hyper::Error) {
    tracing::debug!(peer = %peer_addr, error = %err, "connection closed with error");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: "access", "{}", entry.format(format));
}
