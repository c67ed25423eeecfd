//! HTTP response building module
//!
//! Provides builders for the responses the file server sends. Builders only
//! set status and content headers; the no-cache headers are appended once the
//! response is final (see [`finalize`]).

use super::body::{self, ResponseBody};
use super::{conditional, nocache};
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};

/// Value of the `Server` header
pub const SERVER_NAME: &str = concat!("nocache-server/", env!("CARGO_PKG_VERSION"));

/// Methods the server answers
pub const ALLOWED_METHODS: &str = "GET, HEAD";

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Start a response with the headers every status carries first
fn builder(status: StatusCode) -> hyper::http::response::Builder {
    Response::builder()
        .status(status)
        .header(header::SERVER, SERVER_NAME)
        .header(header::DATE, conditional::http_date_now())
}

/// Append the no-cache headers; the last step before a response is sent
pub fn finalize<B>(mut response: Response<B>) -> Response<B> {
    nocache::apply(response.headers_mut());
    response
}

/// Build 200 response for a regular file
///
/// `body` is either the file stream or an empty body for HEAD; the
/// Content-Length always reflects the file size.
pub fn build_file_response(
    content_type: &str,
    content_length: u64,
    last_modified: Option<&str>,
    body: ResponseBody,
) -> Response<ResponseBody> {
    let mut builder = builder(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, content_length);
    if let Some(last_modified) = last_modified {
        builder = builder.header(header::LAST_MODIFIED, last_modified);
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error("200", &e);
        fallback(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

/// Build generic HTML response
pub fn build_html_response(content: String, is_head: bool) -> Response<ResponseBody> {
    let content_length = content.len();
    let body = if is_head {
        body::empty()
    } else {
        body::full(content)
    };

    builder(StatusCode::OK)
        .header(header::CONTENT_TYPE, HTML_CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, content_length)
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            fallback(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

/// Build 304 Not Modified response
pub fn build_304_response() -> Response<ResponseBody> {
    builder(StatusCode::NOT_MODIFIED)
        .body(body::empty())
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            fallback(StatusCode::NOT_MODIFIED)
        })
}

/// Build 400 Bad Request response; the connection is closed afterwards
pub fn build_400_response(is_head: bool) -> Response<ResponseBody> {
    let mut response = build_error_response(StatusCode::BAD_REQUEST, "Bad request path", is_head);
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

/// Build 404 Not Found response
pub fn build_404_response(is_head: bool) -> Response<ResponseBody> {
    build_error_response(StatusCode::NOT_FOUND, "File not found", is_head)
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(is_head: bool) -> Response<ResponseBody> {
    let mut response = build_error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "Method not allowed",
        is_head,
    );
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    response
}

/// Build an error response with a small HTML page describing the status
pub fn build_error_response(
    status: StatusCode,
    message: &str,
    is_head: bool,
) -> Response<ResponseBody> {
    let page = error_page(status, message);
    let content_length = page.len();
    let body = if is_head {
        body::empty()
    } else {
        body::full(page)
    };

    builder(status)
        .header(header::CONTENT_TYPE, HTML_CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, content_length)
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            fallback(status)
        })
}

/// Encode the reply to a request head the HTTP/1 parser refused
///
/// These are written straight to the socket, so the head is serialized
/// here the way hyper would with title-case names. The connection is
/// closed afterwards.
pub fn encode_rejection(status: StatusCode) -> Vec<u8> {
    let page = error_page(status, rejection_message(status));

    let response = builder(status)
        .header(header::CONTENT_TYPE, HTML_CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, page.len())
        .header(header::CONNECTION, "close")
        .body(())
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            let mut response = Response::new(());
            *response.status_mut() = status;
            response
        });
    let response = finalize(response);

    let mut buf = encode_head(&response);
    buf.extend_from_slice(page.as_bytes());
    buf
}

fn rejection_message(status: StatusCode) -> &'static str {
    match status {
        StatusCode::URI_TOO_LONG => "Request line too long",
        StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE => "Request header fields too large",
        StatusCode::HTTP_VERSION_NOT_SUPPORTED => "Invalid HTTP version",
        _ => "Bad request syntax",
    }
}

fn encode_head<B>(response: &Response<B>) -> Vec<u8> {
    let status = response.status();
    let mut buf = Vec::with_capacity(256);

    // Status line
    buf.extend(b"HTTP/1.1 ");
    buf.extend(status.as_str().as_bytes());
    buf.extend(b" ");
    buf.extend(status.canonical_reason().unwrap_or("").as_bytes());
    buf.extend(b"\r\n");

    // Headers
    for (name, value) in response.headers() {
        let mut upper = true;
        for byte in name.as_str().bytes() {
            buf.push(if upper { byte.to_ascii_uppercase() } else { byte });
            upper = byte == b'-';
        }
        buf.extend(b": ");
        buf.extend(value.as_bytes());
        buf.extend(b"\r\n");
    }

    // Done
    buf.extend(b"\r\n");
    buf
}

fn error_page(status: StatusCode, message: &str) -> String {
    let code = status.as_u16();
    let reason = status.canonical_reason().unwrap_or("Error");
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n<meta charset=\"utf-8\">\n<title>{code} {reason}</title>\n</head>\n\
         <body>\n<h1>{code} {reason}</h1>\n<p>{message}.</p>\n</body>\n\
         </html>\n"
    )
}

/// Bare response used when a builder rejects its input
fn fallback(status: StatusCode) -> Response<ResponseBody> {
    let mut response = Response::new(body::empty());
    *response.status_mut() = status;
    response
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_string(response: Response<ResponseBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_404_response() {
        let response = build_404_response(false);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            HTML_CONTENT_TYPE
        );
        let declared: usize = response.headers()[header::CONTENT_LENGTH]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        let body = body_string(response).await;
        assert_eq!(declared, body.len());
        assert!(body.contains("404 Not Found"));
    }

    #[tokio::test]
    async fn test_head_error_keeps_length_without_body() {
        let response = build_404_response(true);
        assert_ne!(response.headers()[header::CONTENT_LENGTH], "0");
        assert!(body_string(response).await.is_empty());
    }

    #[test]
    fn test_405_response_allow_header() {
        let response = build_405_response(false);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, HEAD");
    }

    #[test]
    fn test_400_response_closes_connection() {
        let response = build_400_response(false);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONNECTION], "close");
    }

    #[test]
    fn test_file_response_headers() {
        let response = build_file_response(
            "text/plain; charset=utf-8",
            5,
            Some("Sun, 06 Nov 1994 08:49:37 GMT"),
            body::empty(),
        );
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "5");
        assert_eq!(
            response.headers()[header::LAST_MODIFIED],
            "Sun, 06 Nov 1994 08:49:37 GMT"
        );
        assert_eq!(response.headers()[header::SERVER], SERVER_NAME);
        assert!(response.headers().contains_key(header::DATE));
    }

    #[test]
    fn test_finalize_appends_no_cache_last() {
        let response = finalize(build_html_response("<p>hi</p>".to_string(), false));
        let names: Vec<&str> = response
            .headers()
            .keys()
            .map(hyper::header::HeaderName::as_str)
            .collect();
        assert_eq!(
            names,
            vec![
                "server",
                "date",
                "content-type",
                "content-length",
                "cache-control",
                "pragma",
                "expires"
            ]
        );
    }

    #[test]
    fn test_every_builder_is_finalized_with_triplet() {
        let responses = vec![
            build_304_response(),
            build_400_response(false),
            build_404_response(false),
            build_405_response(true),
            build_html_response(String::new(), true),
        ];
        for response in responses {
            let response = finalize(response);
            let headers = response.headers();
            assert_eq!(headers.get_all(header::CACHE_CONTROL).iter().count(), 1);
            assert_eq!(headers[header::CACHE_CONTROL], nocache::CACHE_CONTROL_VALUE);
            assert_eq!(headers[header::PRAGMA], "no-cache");
            assert_eq!(headers[header::EXPIRES], "0");
        }
    }

    #[test]
    fn test_rejection_wire_format() {
        let raw = String::from_utf8(encode_rejection(StatusCode::BAD_REQUEST)).unwrap();
        let (head, page) = raw.split_once("\r\n\r\n").unwrap();
        let lines: Vec<&str> = head.split("\r\n").collect();
        let length = format!("Content-Length: {}", page.len());

        assert_eq!(lines[0], "HTTP/1.1 400 Bad Request");
        assert_eq!(lines[1], format!("Server: {SERVER_NAME}"));
        assert!(lines[2].starts_with("Date: "));
        assert_eq!(
            &lines[3..],
            [
                "Content-Type: text/html; charset=utf-8",
                length.as_str(),
                "Connection: close",
                "Cache-Control: no-cache, no-store, must-revalidate",
                "Pragma: no-cache",
                "Expires: 0",
            ]
        );
        assert!(page.contains("400 Bad Request"));
    }

    #[test]
    fn test_rejection_statuses() {
        for (status, line) in [
            (StatusCode::URI_TOO_LONG, "HTTP/1.1 414 URI Too Long\r\n"),
            (
                StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
                "HTTP/1.1 431 Request Header Fields Too Large\r\n",
            ),
            (
                StatusCode::HTTP_VERSION_NOT_SUPPORTED,
                "HTTP/1.1 505 HTTP Version Not Supported\r\n",
            ),
        ] {
            let raw = String::from_utf8(encode_rejection(status)).unwrap();
            assert!(raw.starts_with(line), "got {raw:?}");
            assert!(raw.contains("\r\nExpires: 0\r\n\r\n"));
        }
    }
}
