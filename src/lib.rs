//! Static file server that disables client and proxy caching on every response.
//!
//! Files are served from a single root directory over HTTP/1.x. Each
//! response, whatever its status, ends its header block with
//! `Cache-Control: no-cache, no-store, must-revalidate`, `Pragma: no-cache`
//! and `Expires: 0`.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use config::{AppState, Config};
pub use error::ServerError;
