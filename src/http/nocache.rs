//! Cache-defeating response headers
//!
//! Every response leaves the server with the same three headers, appended
//! after whatever content headers the responder set.

use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};

pub const CACHE_CONTROL_VALUE: &str = "no-cache, no-store, must-revalidate";
pub const PRAGMA_VALUE: &str = "no-cache";
pub const EXPIRES_VALUE: &str = "0";

/// The no-cache header triplet, in wire order
pub const NO_CACHE_HEADERS: [(HeaderName, HeaderValue); 3] = [
    (
        header::CACHE_CONTROL,
        HeaderValue::from_static(CACHE_CONTROL_VALUE),
    ),
    (header::PRAGMA, HeaderValue::from_static(PRAGMA_VALUE)),
    (header::EXPIRES, HeaderValue::from_static(EXPIRES_VALUE)),
];

/// Append the no-cache headers to a finished header map.
///
/// Must run after all content headers are in place: `HeaderMap` keeps
/// insertion order, so the triplet ends up last. Existing values for the
/// same names are dropped, leaving exactly one of each.
pub fn apply(headers: &mut HeaderMap) {
    if NO_CACHE_HEADERS
        .iter()
        .any(|(name, _)| headers.contains_key(name))
    {
        strip_no_cache(headers);
    }
    for (name, value) in NO_CACHE_HEADERS {
        headers.insert(name, value);
    }
}

/// Rebuild the map without the triplet's names
///
/// `HeaderMap::remove` swaps the last entry into the freed slot, which
/// would reorder the content headers.
fn strip_no_cache(headers: &mut HeaderMap) {
    let mut current: Option<HeaderName> = None;
    for (name, value) in std::mem::take(headers) {
        if let Some(name) = name {
            current = Some(name);
        }
        if let Some(name) = &current {
            if !NO_CACHE_HEADERS.iter().any(|(n, _)| n == name) {
                headers.append(name.clone(), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(headers: &HeaderMap) -> Vec<&str> {
        headers.keys().map(HeaderName::as_str).collect()
    }

    #[test]
    fn test_apply_adds_exact_values() {
        let mut headers = HeaderMap::new();
        apply(&mut headers);
        assert_eq!(
            headers.get(header::CACHE_CONTROL).unwrap(),
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(headers.get(header::PRAGMA).unwrap(), "no-cache");
        assert_eq!(headers.get(header::EXPIRES).unwrap(), "0");
    }

    #[test]
    fn test_apply_after_content_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(5));
        apply(&mut headers);
        assert_eq!(
            names(&headers),
            vec![
                "content-type",
                "content-length",
                "cache-control",
                "pragma",
                "expires"
            ]
        );
    }

    #[test]
    fn test_apply_replaces_existing_values() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=3600"),
        );
        headers.append(header::CACHE_CONTROL, HeaderValue::from_static("immutable"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/css"));
        apply(&mut headers);

        assert_eq!(headers.get_all(header::CACHE_CONTROL).iter().count(), 1);
        assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), CACHE_CONTROL_VALUE);
        assert_eq!(
            names(&headers),
            vec!["content-type", "cache-control", "pragma", "expires"]
        );
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut headers = HeaderMap::new();
        apply(&mut headers);
        apply(&mut headers);
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn test_apply_keeps_order_when_replacing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::SERVER, HeaderValue::from_static("test"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("public"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        headers.append(header::VARY, HeaderValue::from_static("accept"));
        headers.append(header::VARY, HeaderValue::from_static("origin"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(5));
        apply(&mut headers);

        assert_eq!(
            names(&headers),
            vec![
                "server",
                "content-type",
                "vary",
                "content-length",
                "cache-control",
                "pragma",
                "expires"
            ]
        );
        let vary: Vec<_> = headers.get_all(header::VARY).iter().collect();
        assert_eq!(vary, vec!["accept", "origin"]);
        assert_eq!(headers[header::PRAGMA], PRAGMA_VALUE);
    }
}
