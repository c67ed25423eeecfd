//! Conditional request module
//!
//! HTTP-date handling and `If-Modified-Since` evaluation.

use chrono::{DateTime, Utc};
use std::time::SystemTime;

/// Format a timestamp as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Current time as an HTTP date, used for the `Date` header
pub fn http_date_now() -> String {
    format_http_date(Utc::now())
}

/// Parse an HTTP date header value
///
/// Accepts the IMF-fixdate form, which is RFC 2822 with a `GMT` zone.
/// Returns `None` for anything else, in which case the header is ignored.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Decide whether a conditional GET can be answered with 304
///
/// `If-None-Match` takes precedence: when present, `If-Modified-Since` is
/// ignored and the full response is sent since no entity tags are issued.
/// Modification times are compared at one-second resolution, the
/// granularity of HTTP dates.
///
/// # Arguments
/// * `if_modified_since` - Client-sent If-Modified-Since header
/// * `if_none_match` - Client-sent If-None-Match header
/// * `modified` - File modification time
pub fn is_not_modified(
    if_modified_since: Option<&str>,
    if_none_match: Option<&str>,
    modified: SystemTime,
) -> bool {
    if if_none_match.is_some() {
        return false;
    }
    let Some(since) = if_modified_since.and_then(parse_http_date) else {
        return false;
    };
    DateTime::<Utc>::from(modified).timestamp() <= since.timestamp()
}
