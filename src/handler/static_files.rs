//! Static file serving module
//!
//! Opens files and directories under the root and builds their responses.

use crate::handler::{listing, path};
use crate::handler::router::RequestContext;
use crate::http::{self, body, conditional, mime, ResponseBody};
use chrono::{DateTime, Utc};
use hyper::Response;
use std::path::{Path, PathBuf};
use tokio::fs::File;

/// Serve a regular file
///
/// Responds 404 when the file cannot be opened, and 304 when the
/// conditional headers show the client copy is current. The body is
/// streamed, so a read error mid-way aborts the connection.
pub async fn serve_file(
    ctx: &RequestContext<'_>,
    file_path: &Path,
    chunk_size: usize,
) -> Response<ResponseBody> {
    let file = match File::open(file_path).await {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!(path = %file_path.display(), error = %e, "failed to open file");
            return http::build_404_response(ctx.is_head);
        }
    };

    let metadata = match file.metadata().await {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(path = %file_path.display(), error = %e, "failed to stat file");
            return http::build_404_response(ctx.is_head);
        }
    };

    let modified = metadata.modified().ok();
    if let Some(modified) = modified {
        if conditional::is_not_modified(
            ctx.if_modified_since.as_deref(),
            ctx.if_none_match.as_deref(),
            modified,
        ) {
            return http::build_304_response();
        }
    }

    let last_modified =
        modified.map(|t| conditional::format_http_date(DateTime::<Utc>::from(t)));
    let body = if ctx.is_head {
        body::empty()
    } else {
        body::file_stream(file, chunk_size)
    };

    http::build_file_response(
        mime::content_type_for(file_path),
        metadata.len(),
        last_modified.as_deref(),
        body,
    )
}

/// Index documents tried, in order, before a directory is listed
pub const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Serve a directory: its index document if it has one, otherwise an HTML
/// listing of its entries
///
/// The index must be a regular file whose canonical path stays under
/// `root`, the same rule request paths follow.
pub async fn serve_directory(
    ctx: &RequestContext<'_>,
    root: &Path,
    dir: &Path,
    chunk_size: usize,
) -> Response<ResponseBody> {
    if let Some(index) = find_index(ctx, root, dir).await {
        return serve_file(ctx, &index, chunk_size).await;
    }

    let entries = match listing::read_entries(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(path = %dir.display(), error = %e, "failed to list directory");
            return http::build_404_response(ctx.is_head);
        }
    };

    let html = listing::render(&ctx.target.decoded, ctx.raw_path, &entries);
    http::build_html_response(html, ctx.is_head)
}

async fn find_index(ctx: &RequestContext<'_>, root: &Path, dir: &Path) -> Option<PathBuf> {
    for name in INDEX_FILES {
        let Some(index) = path::contain(root, &dir.join(name), &ctx.target.decoded).await else {
            continue;
        };
        if tokio::fs::metadata(&index).await.is_ok_and(|m| m.is_file()) {
            return Some(index);
        }
    }
    None
}
