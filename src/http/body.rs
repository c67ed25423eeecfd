//! Response body types
//!
//! Buffered bodies for generated pages and a chunked stream for files, both
//! erased behind one boxed body type so handlers return a single response type.

use futures_util::stream;
use http_body_util::{combinators::UnsyncBoxBody, BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use std::io;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Body type of every response the server produces
pub type ResponseBody = UnsyncBoxBody<Bytes, io::Error>;

/// Body with no content (HEAD requests, 304 responses)
pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Fully buffered body
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Stream a file in `chunk_size` pieces
///
/// A read error ends the stream with that error; hyper then aborts the
/// response and closes the connection instead of sending a short body.
pub fn file_stream(file: File, chunk_size: usize) -> ResponseBody {
    let chunk_size = chunk_size.max(1);
    let chunks = stream::try_unfold(file, move |mut file: File| async move {
        let mut buf = vec![0u8; chunk_size];
        let n = file.read(&mut buf).await?;
        let next = if n == 0 {
            None
        } else {
            buf.truncate(n);
            Some((Frame::data(Bytes::from(buf)), file))
        };
        Ok::<_, io::Error>(next)
    });
    StreamBody::new(chunks).boxed_unsync()
}
