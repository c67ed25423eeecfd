// Request head guard
// Sits between the socket and hyper so malformed request heads are answered
// by our own responses, no-cache headers included

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use hyper::StatusCode;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::http::{self, head::{self, BodyLength, HeadCheck}};
use crate::logger;

const READ_CHUNK: usize = 8192;

/// Most unread input discarded before the rejection goes out
const MAX_DRAIN: usize = 1 << 20;

enum State {
    /// Next bytes start a request head
    Head,
    /// Body bytes still owed to the current request
    Body(u64),
    /// Chunked body; framing is left to hyper for the rest of the connection
    Passthrough,
    /// Head refused; reads report end of input
    Rejected,
    /// Writing the rejection on shutdown
    Replying { reply: Vec<u8>, written: usize },
    Closed,
}

/// IO wrapper that checks every request head before hyper reads it
///
/// Valid heads and their bodies are released to hyper unchanged. At a
/// refused head, hyper sees end of input, finishes the responses it owes
/// and shuts the connection down; the rejection is written at that point,
/// so it stays in order after earlier pipelined responses.
pub struct HeadGuard<T> {
    inner: T,
    /// Bytes read from `inner` and not yet handed to hyper
    buf: Vec<u8>,
    /// Length of the checked prefix of `buf`
    ready: usize,
    state: State,
    rejected: Option<StatusCode>,
}

impl<T> HeadGuard<T> {
    pub const fn new(inner: T) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            ready: 0,
            state: State::Head,
            rejected: None,
        }
    }

    /// Status chosen for the refused request head, if there was one
    pub const fn rejection(&self) -> Option<StatusCode> {
        self.rejected
    }

    /// Check buffered bytes; `false` means more input is needed
    fn advance(&mut self) -> bool {
        let pending = self.buf.len() - self.ready;
        if pending == 0 {
            return false;
        }

        match self.state {
            State::Head => match head::check(&self.buf[self.ready..]) {
                HeadCheck::Complete { head_len, body } => {
                    self.ready += head_len;
                    self.state = match body {
                        BodyLength::Fixed(0) => State::Head,
                        BodyLength::Fixed(n) => State::Body(n),
                        BodyLength::Chunked => State::Passthrough,
                    };
                    true
                }
                HeadCheck::Partial => false,
                HeadCheck::Reject(status) => {
                    logger::log_warning(&format!("Rejected malformed request head: {status}"));
                    self.buf.truncate(self.ready);
                    self.rejected = Some(status);
                    self.state = State::Rejected;
                    true
                }
            },
            State::Body(remaining) => {
                let take = usize::try_from(remaining).map_or(pending, |r| r.min(pending));
                self.ready += take;
                let left = remaining - take as u64;
                self.state = if left == 0 { State::Head } else { State::Body(left) };
                true
            }
            State::Passthrough => {
                self.ready = self.buf.len();
                true
            }
            State::Rejected | State::Replying { .. } | State::Closed => false,
        }
    }
}

impl<T: AsyncRead + Unpin> HeadGuard<T> {
    fn poll_fill(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<usize>> {
        let mut chunk = [0u8; READ_CHUNK];
        let mut read_buf = ReadBuf::new(&mut chunk);
        ready!(Pin::new(&mut self.inner).poll_read(cx, &mut read_buf))?;
        let filled = read_buf.filled();
        self.buf.extend_from_slice(filled);
        Poll::Ready(Ok(filled.len()))
    }

    /// Discard input that has already arrived
    ///
    /// Closing a socket with unread input resets the connection, and the
    /// peer may then lose the rejection before reading it.
    fn drain_arrived(&mut self, cx: &mut Context<'_>) {
        let mut chunk = [0u8; READ_CHUNK];
        let mut drained = 0;
        while drained < MAX_DRAIN {
            let mut read_buf = ReadBuf::new(&mut chunk);
            match Pin::new(&mut self.inner).poll_read(cx, &mut read_buf) {
                Poll::Ready(Ok(())) if !read_buf.filled().is_empty() => {
                    drained += read_buf.filled().len();
                }
                _ => break,
            }
        }
    }
}

impl<T: AsyncRead + AsyncWrite + Unpin> HeadGuard<T> {
    fn poll_reply(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if matches!(self.state, State::Rejected) {
            if let Some(status) = self.rejected {
                self.buf.clear();
                self.drain_arrived(cx);
                self.state = State::Replying {
                    reply: http::encode_rejection(status),
                    written: 0,
                };
            }
        }

        while let State::Replying { reply, written } = &mut self.state {
            if *written == reply.len() {
                ready!(Pin::new(&mut self.inner).poll_flush(cx))?;
                self.state = State::Closed;
                break;
            }
            let n = ready!(Pin::new(&mut self.inner).poll_write(cx, &reply[*written..]))?;
            if n == 0 {
                return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
            }
            *written += n;
        }

        Poll::Ready(Ok(()))
    }
}

impl<T: AsyncRead + Unpin> AsyncRead for HeadGuard<T> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        out: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            if this.ready > 0 {
                let n = this.ready.min(out.remaining());
                out.put_slice(&this.buf[..n]);
                this.buf.drain(..n);
                this.ready -= n;
                return Poll::Ready(Ok(()));
            }

            if !matches!(
                this.state,
                State::Head | State::Body(_) | State::Passthrough
            ) {
                return Poll::Ready(Ok(()));
            }

            if this.advance() {
                continue;
            }

            if ready!(this.poll_fill(cx))? == 0 {
                // Peer closed; an unfinished head is dropped
                this.buf.clear();
                this.state = State::Closed;
                return Poll::Ready(Ok(()));
            }
        }
    }
}

impl<T: AsyncRead + AsyncWrite + Unpin> AsyncWrite for HeadGuard<T> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, data)
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_reply(cx))?;
        Pin::new(&mut this.inner).poll_shutdown(cx)
    }
}
