//! Access log format module
//!
//! Supports two log formats:
//! - `common` (Common Log Format - CLF)
//! - `combined` (Apache/Nginx combined format)
//!
//! Unknown format names fall back to `common`.

use chrono::Local;
use std::fmt::Write;

/// Access log entry containing all request/response information
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client IP address
    pub remote_addr: String,
    /// Request timestamp
    pub time: chrono::DateTime<Local>,
    /// HTTP method (GET, HEAD, ...)
    pub method: String,
    /// Request URI path and query as received
    pub uri: String,
    /// HTTP version (1.0, 1.1)
    pub http_version: String,
    /// Response status code
    pub status: u16,
    /// Response body size in bytes, unknown when no Content-Length was sent
    pub body_bytes: Option<u64>,
    /// Referer header
    pub referer: Option<String>,
    /// User-Agent header
    pub user_agent: Option<String>,
}

impl AccessLogEntry {
    /// Create a new access log entry with current timestamp
    pub fn new(remote_addr: String, method: String, uri: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            uri,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: None,
            referer: None,
            user_agent: None,
        }
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => self.format_combined(),
            _ => self.format_common(),
        }
    }

    /// Common Log Format (CLF)
    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{} {} HTTP/{}\" {} {}",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            escape(&self.uri),
            self.http_version,
            self.status,
            self.body_bytes
                .map_or_else(|| "-".to_string(), |n| n.to_string()),
        )
    }

    /// Apache/Nginx Combined Log Format
    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent "$http_referer" "$http_user_agent"`
    fn format_combined(&self) -> String {
        format!(
            "{} \"{}\" \"{}\"",
            self.format_common(),
            self.referer.as_deref().map_or_else(|| "-".to_string(), escape),
            self.user_agent.as_deref().map_or_else(|| "-".to_string(), escape),
        )
    }
}

/// Escape a client-supplied field the way nginx does: `"`, `\`, control
/// and non-ASCII bytes become `\xHH`, so a value cannot end its quoted
/// field or start a new log line.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'"' | b'\\' | 0..=0x1f | 0x7f..=0xff => {
                let _ = write!(out, "\\x{byte:02X}");
            }
            _ => out.push(char::from(byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(
            "192.168.1.1".to_string(),
            "GET".to_string(),
            "/assets/app.js?v=2".to_string(),
        );
        entry.status = 200;
        entry.body_bytes = Some(1234);
        entry.referer = Some("http://localhost:3001/".to_string());
        entry.user_agent = Some("Mozilla/5.0".to_string());
        entry
    }

    #[test]
    fn test_format_common() {
        let entry = create_test_entry();
        let log = entry.format("common");
        assert!(log.starts_with("192.168.1.1 - - ["));
        assert!(log.contains("\"GET /assets/app.js?v=2 HTTP/1.1\""));
        assert!(log.ends_with("200 1234"));
        // Common format does not include referer/user-agent
        assert!(!log.contains("Mozilla"));
    }

    #[test]
    fn test_format_combined() {
        let entry = create_test_entry();
        let log = entry.format("combined");
        assert!(log.contains("200 1234"));
        assert!(log.ends_with("\"http://localhost:3001/\" \"Mozilla/5.0\""));
    }

    #[test]
    fn test_unknown_size_and_headers() {
        let mut entry = create_test_entry();
        entry.status = 304;
        entry.body_bytes = None;
        entry.referer = None;
        entry.user_agent = None;
        let log = entry.format("combined");
        assert!(log.contains("304 - \"-\" \"-\""));
    }

    #[test]
    fn test_unknown_format_falls_back_to_common() {
        let entry = create_test_entry();
        assert_eq!(entry.format("json"), entry.format("common"));
    }

    #[test]
    fn test_quoted_fields_are_escaped() {
        let mut entry = create_test_entry();
        entry.uri = "/a\"b".to_string();
        entry.referer = Some("x\" 999 \"forged".to_string());
        entry.user_agent = Some("agent\nline\\two\u{e9}".to_string());
        let log = entry.format("combined");
        assert!(log.contains("\"GET /a\\x22b HTTP/1.1\""));
        assert!(log.ends_with(
            "\"x\\x22 999 \\x22forged\" \"agent\\x0Aline\\x5Ctwo\\xC3\\xA9\""
        ));
        assert!(!log.contains('\n'));
    }
}
