// Connection handling module
// Serves a single TCP connection in its own task

use std::sync::Arc;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;

use super::guard::HeadGuard;
use crate::config;
use crate::handler;
use crate::logger;

/// Accept a connection and hand it to its own task.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<config::AppState>,
) {
    logger::log_connection_accepted(&peer_addr);

    tokio::spawn(handle_connection(stream, peer_addr, Arc::clone(state)));
}

/// Serve one connection until the peer closes it or an error ends it.
///
/// This function:
/// 1. Wraps the TCP stream in a [`HeadGuard`] and `TokioIo`
/// 2. Configures HTTP/1 connection settings (keep-alive, header casing)
/// 3. Serves every request on the connection with the request handler
///
/// hyper decides per request whether the connection stays open (HTTP
/// version and `Connection` header). Request heads hyper would refuse are
/// stopped by the guard, which answers them itself and ends the
/// connection. Body stream errors also end it; other connections are
/// unaffected.
async fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: Arc<config::AppState>,
) {
    let io = TokioIo::new(HeadGuard::new(stream));

    // Title-case header names so the no-cache headers go out byte-exact.
    // Half-close keeps in-flight responses going when the guard ends input.
    let mut builder = http1::Builder::new();
    builder
        .keep_alive(state.config.http.keep_alive)
        .half_close(true)
        .title_case_headers(true);

    let conn = builder.serve_connection(
        io,
        service_fn(move |req| handler::handle_request(req, Arc::clone(&state), peer_addr)),
    );

    if let Err(err) = conn.await {
        logger::log_connection_error(&peer_addr, &err);
    }
}
