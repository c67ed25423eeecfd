//! Request head validation
//!
//! Checks a buffered request head with `httparse` before hyper sees it, so
//! requests that would fail hyper's parser are answered by our own
//! responses instead. The limits mirror hyper's HTTP/1 defaults, so nothing
//! hyper accepts is refused here.

use hyper::{StatusCode, Uri};

/// Most header fields accepted in one request
pub const MAX_HEADERS: usize = 100;

/// Longest request line accepted while it is still incomplete
pub const MAX_REQUEST_LINE: usize = 65_536;

/// Longest request target `Uri` can hold
pub const MAX_URI_LEN: usize = 65_534;

/// Largest request head buffered before giving up
pub const MAX_HEAD_LEN: usize = 8192 + 4096 * 100;

/// How the bytes after a head are framed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyLength {
    Fixed(u64),
    Chunked,
}

/// Outcome of checking the bytes buffered so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadCheck {
    /// A valid head of `head_len` bytes followed by a body framed as `body`
    Complete { head_len: usize, body: BodyLength },
    /// Valid so far, more bytes needed
    Partial,
    /// The request must be refused with this status
    Reject(StatusCode),
}

/// Check the start of `buf` for a request head
pub fn check(buf: &[u8]) -> HeadCheck {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut request = httparse::Request::new(&mut headers);

    match request.parse(buf) {
        Ok(httparse::Status::Complete(head_len)) => check_complete(&request, head_len),
        Ok(httparse::Status::Partial) => check_partial(buf),
        Err(httparse::Error::TooManyHeaders) => {
            HeadCheck::Reject(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE)
        }
        Err(httparse::Error::Version) => HeadCheck::Reject(version_status(buf)),
        Err(_) => HeadCheck::Reject(StatusCode::BAD_REQUEST),
    }
}

fn check_complete(request: &httparse::Request<'_, '_>, head_len: usize) -> HeadCheck {
    let Some(path) = request.path else {
        return HeadCheck::Reject(StatusCode::BAD_REQUEST);
    };
    if path.len() > MAX_URI_LEN {
        return HeadCheck::Reject(StatusCode::URI_TOO_LONG);
    }
    if path.parse::<Uri>().is_err() {
        return HeadCheck::Reject(StatusCode::BAD_REQUEST);
    }

    match body_length(request.version, &*request.headers) {
        Ok(body) => HeadCheck::Complete { head_len, body },
        Err(status) => HeadCheck::Reject(status),
    }
}

fn check_partial(buf: &[u8]) -> HeadCheck {
    let line_done = buf.contains(&b'\n');
    if !line_done && buf.len() > MAX_REQUEST_LINE {
        HeadCheck::Reject(StatusCode::URI_TOO_LONG)
    } else if buf.len() >= MAX_HEAD_LEN {
        HeadCheck::Reject(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE)
    } else {
        HeadCheck::Partial
    }
}

/// Body framing from `Transfer-Encoding` and `Content-Length`
///
/// Follows hyper's server rules: `Transfer-Encoding` is refused on
/// HTTP/1.0 and must end in `chunked`; it overrides `Content-Length`,
/// whose values must be digits and agree with each other.
fn body_length(
    version: Option<u8>,
    headers: &[httparse::Header<'_>],
) -> Result<BodyLength, StatusCode> {
    let mut chunked = None;
    let mut length: Option<u64> = None;

    for header in headers {
        if header.name.eq_ignore_ascii_case("transfer-encoding") {
            if version == Some(0) {
                return Err(StatusCode::BAD_REQUEST);
            }
            let last = std::str::from_utf8(header.value)
                .ok()
                .and_then(|v| v.rsplit(',').next())
                .map(str::trim);
            chunked = Some(last.is_some_and(|c| c.eq_ignore_ascii_case("chunked")));
        } else if header.name.eq_ignore_ascii_case("content-length") {
            let value = parse_content_length(header.value).ok_or(StatusCode::BAD_REQUEST)?;
            if length.is_some_and(|l| l != value) {
                return Err(StatusCode::BAD_REQUEST);
            }
            length = Some(value);
        }
    }

    match chunked {
        Some(true) => Ok(BodyLength::Chunked),
        Some(false) => Err(StatusCode::BAD_REQUEST),
        None => Ok(BodyLength::Fixed(length.unwrap_or(0))),
    }
}

fn parse_content_length(value: &[u8]) -> Option<u64> {
    let value = std::str::from_utf8(value).ok()?;
    let mut result = None;
    for part in value.split(',') {
        let part = part.trim();
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let n: u64 = part.parse().ok()?;
        if result.is_some_and(|r| r != n) {
            return None;
        }
        result = Some(n);
    }
    result
}

/// 505 for a well-formed `HTTP/x.y` with a major version above 1, 400 for
/// anything else httparse refused as a version
fn version_status(buf: &[u8]) -> StatusCode {
    let line = buf
        .split(|&b| b == b'\n')
        .map(|l| l.strip_suffix(b"\r").unwrap_or(l))
        .find(|l| !l.is_empty())
        .unwrap_or_default();
    let line = String::from_utf8_lossy(line);

    let major = line
        .rsplit(' ')
        .next()
        .and_then(|v| v.strip_prefix("HTTP/"))
        .and_then(|v| v.split_once('.'))
        .and_then(|(major, minor)| {
            minor.parse::<u32>().ok()?;
            major.parse::<u32>().ok()
        });

    match major {
        Some(major) if major >= 2 => StatusCode::HTTP_VERSION_NOT_SUPPORTED,
        _ => StatusCode::BAD_REQUEST,
    }
}
