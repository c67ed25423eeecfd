//! Request path resolution
//!
//! Maps a URI path onto the served root. Decoding and segment filtering
//! happen on the string; the final check runs on the canonical filesystem
//! path so that symlinks cannot lead outside the root either.

use crate::logger;
use std::path::{Path, PathBuf};

/// A request path that passed syntactic checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    /// Percent-decoded path as requested, used for display
    pub decoded: String,
    /// Path relative to the root with empty, `.` and `..` segments removed
    pub relative: PathBuf,
    /// Whether the request path ended with `/`
    pub trailing_slash: bool,
}

/// Why a request path was rejected before touching the filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadPath {
    /// Percent-decoding produced invalid UTF-8
    Encoding,
    /// Path contains a NUL byte
    NulByte,
}

/// Decode and sanitize a raw URI path (without query string)
///
/// `..` segments are dropped rather than resolved, so `/a/../b` maps to
/// `a/b`; no request path can climb above the root.
pub fn parse_request_path(raw: &str) -> Result<RequestTarget, BadPath> {
    let decoded = urlencoding::decode(raw).map_err(|_| BadPath::Encoding)?;
    if decoded.contains('\0') {
        return Err(BadPath::NulByte);
    }

    let relative = decoded
        .split('/')
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
        .collect::<PathBuf>();

    Ok(RequestTarget {
        trailing_slash: decoded.ends_with('/'),
        decoded: decoded.into_owned(),
        relative,
    })
}

/// Locate a request target on disk
///
/// Returns the canonical path when it exists and stays inside `root`
/// (which must itself be canonical). Missing files return `None` silently;
/// escapes are logged.
pub async fn locate(root: &Path, target: &RequestTarget) -> Option<PathBuf> {
    contain(root, &root.join(&target.relative), &target.decoded).await
}

/// Canonicalize `candidate` and keep it only if it lies under `root`
///
/// `shown` names the request in the warning logged for an escape.
pub async fn contain(root: &Path, candidate: &Path, shown: &str) -> Option<PathBuf> {
    // File not found is common (404), no need to log
    let canonical = tokio::fs::canonicalize(candidate).await.ok()?;

    if !canonical.starts_with(root) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            shown,
            canonical.display()
        ));
        return None;
    }

    Some(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path() {
        let target = parse_request_path("/css/site.css").unwrap();
        assert_eq!(target.relative, PathBuf::from("css/site.css"));
        assert_eq!(target.decoded, "/css/site.css");
        assert!(!target.trailing_slash);
    }

    #[test]
    fn test_root_path() {
        let target = parse_request_path("/").unwrap();
        assert_eq!(target.relative, PathBuf::new());
        assert!(target.trailing_slash);
    }

    #[test]
    fn test_percent_decoding() {
        let target = parse_request_path("/my%20file.txt").unwrap();
        assert_eq!(target.relative, PathBuf::from("my file.txt"));
        assert_eq!(target.decoded, "/my file.txt");
    }

    #[test]
    fn test_dot_segments_removed() {
        let target = parse_request_path("/../../etc/passwd").unwrap();
        assert_eq!(target.relative, PathBuf::from("etc/passwd"));

        let target = parse_request_path("/a/./b/../c//d/").unwrap();
        assert_eq!(target.relative, PathBuf::from("a/b/c/d"));
        assert!(target.trailing_slash);
    }

    #[test]
    fn test_encoded_dot_segments_removed() {
        let target = parse_request_path("/%2e%2e/%2E%2E/secret").unwrap();
        assert_eq!(target.relative, PathBuf::from("secret"));
    }

    #[test]
    fn test_encoded_slash_is_a_separator() {
        let target = parse_request_path("/..%2f..%2fsecret").unwrap();
        assert_eq!(target.relative, PathBuf::from("secret"));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        assert_eq!(parse_request_path("/%FF%FE"), Err(BadPath::Encoding));
    }

    #[test]
    fn test_nul_byte_rejected() {
        assert_eq!(parse_request_path("/a%00b"), Err(BadPath::NulByte));
    }

    #[tokio::test]
    async fn test_locate_inside_and_missing() {
        let root = std::env::temp_dir()
            .join(format!("nocache-locate-test-{}", std::process::id()));
        tokio::fs::create_dir_all(root.join("sub")).await.unwrap();
        tokio::fs::write(root.join("sub/file.txt"), b"x").await.unwrap();
        let root = root.canonicalize().unwrap();

        let found = locate(&root, &parse_request_path("/sub/file.txt").unwrap()).await;
        assert_eq!(found, Some(root.join("sub/file.txt")));

        let found = locate(&root, &parse_request_path("/").unwrap()).await;
        assert_eq!(found, Some(root.clone()));

        let missing = locate(&root, &parse_request_path("/nope.txt").unwrap()).await;
        assert_eq!(missing, None);

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_contain_rejects_symlink_out_of_root() {
        let base = std::env::temp_dir()
            .join(format!("nocache-contain-test-{}", std::process::id()));
        tokio::fs::create_dir_all(base.join("root")).await.unwrap();
        tokio::fs::write(base.join("outside.html"), b"x").await.unwrap();
        std::os::unix::fs::symlink(base.join("outside.html"), base.join("root/index.html"))
            .unwrap();
        let root = base.join("root").canonicalize().unwrap();

        assert_eq!(contain(&root, &root.join("index.html"), "/").await, None);

        tokio::fs::remove_dir_all(&base).await.unwrap();
    }
}
