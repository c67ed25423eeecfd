//! Request dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation,
//! path resolution, and dispatching to the file or directory responder.

use crate::config::AppState;
use crate::handler::path::{self, RequestTarget};
use crate::handler::static_files;
use crate::http::{self, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use hyper::header::{self, HeaderMap};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// URI path as received, still percent-encoded
    pub raw_path: &'a str,
    pub target: RequestTarget,
    pub is_head: bool,
    pub if_modified_since: Option<String>,
    pub if_none_match: Option<String>,
}

/// Main entry point for HTTP request handling
///
/// Every response passes through [`http::finalize`] here, so the no-cache
/// headers are present whatever branch produced it.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    // Request bodies are never read
    let (parts, _) = req.into_parts();

    let response = http::finalize(respond(&parts, &state).await);

    if state.config.logging.access_log {
        log_access(&parts, &response, peer_addr, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Produce the response for a request, before the no-cache headers
pub async fn respond(parts: &Parts, state: &AppState) -> Response<ResponseBody> {
    let is_head = parts.method == Method::HEAD;

    // 1. Check HTTP method
    if let Some(resp) = check_http_method(&parts.method) {
        return resp;
    }

    // 2. Decode and sanitize the path
    let raw_path = parts.uri.path();
    let target = match path::parse_request_path(raw_path) {
        Ok(t) => t,
        Err(e) => {
            logger::log_warning(&format!("Rejected request path {raw_path:?}: {e:?}"));
            return http::build_400_response(is_head);
        }
    };

    // 3. Resolve against the root
    let Some(resolved) = path::locate(&state.root, &target).await else {
        return http::build_404_response(is_head);
    };

    let ctx = RequestContext {
        raw_path,
        target,
        is_head,
        if_modified_since: header_string(&parts.headers, &header::IF_MODIFIED_SINCE),
        if_none_match: header_string(&parts.headers, &header::IF_NONE_MATCH),
    };

    // 4. Dispatch on what the path points at
    let Ok(metadata) = tokio::fs::metadata(&resolved).await else {
        return http::build_404_response(is_head);
    };

    let chunk_size = state.config.http.read_chunk_size;
    if metadata.is_dir() {
        static_files::serve_directory(&ctx, &state.root, &resolved, chunk_size).await
    } else if metadata.is_file() && !ctx.target.trailing_slash {
        static_files::serve_file(&ctx, &resolved, chunk_size).await
    } else {
        // A file addressed as a directory, or a socket/FIFO/device
        http::build_404_response(is_head)
    }
}

/// Check HTTP method and return 405 for anything but GET/HEAD
fn check_http_method(method: &Method) -> Option<Response<ResponseBody>> {
    match *method {
        Method::GET | Method::HEAD => None,
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response(false))
        }
    }
}

fn header_string(headers: &HeaderMap, name: &header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

fn log_access(
    parts: &Parts,
    response: &Response<ResponseBody>,
    peer_addr: SocketAddr,
    format: &str,
) {
    let uri = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);

    let mut entry = AccessLogEntry::new(peer_addr.ip().to_string(), parts.method.to_string(), uri);
    entry.http_version = version_str(parts.version).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = if parts.method == Method::HEAD {
        None
    } else {
        response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    };
    entry.referer = header_string(&parts.headers, &header::REFERER);
    entry.user_agent = header_string(&parts.headers, &header::USER_AGENT);

    logger::log_access(&entry, format);
}
