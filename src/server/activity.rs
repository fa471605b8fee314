// Connection activity tracking
// Records when a connection last moved bytes and whether a request is in progress

use std::cell::Cell;
use std::io;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::Instant;

/// Per-connection activity shared between the socket wrapper and its task
///
/// A connection is *pending* from the first request byte read until response
/// bytes are written back. While pending it is never closed for idleness or
/// shutdown, so partially received requests still get their answer.
#[derive(Debug)]
pub struct ConnActivity {
    last: Cell<Instant>,
    pending: Cell<bool>,
}

impl ConnActivity {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            last: Cell::new(Instant::now()),
            pending: Cell::new(false),
        })
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }

    /// Instant at which the connection has been idle for `keep_alive`
    ///
    /// A pending connection is re-checked a full `keep_alive` from now.
    pub fn idle_deadline(&self, keep_alive: Duration) -> Instant {
        if self.pending.get() {
            Instant::now() + keep_alive
        } else {
            self.last.get() + keep_alive
        }
    }

    fn on_read(&self) {
        self.last.set(Instant::now());
        self.pending.set(true);
    }

    fn on_write(&self) {
        self.last.set(Instant::now());
        self.pending.set(false);
    }
}

/// Socket wrapper feeding [`ConnActivity`]
pub struct TrackedStream<T> {
    inner: T,
    activity: Rc<ConnActivity>,
}

impl<T> TrackedStream<T> {
    pub const fn new(inner: T, activity: Rc<ConnActivity>) -> Self {
        Self { inner, activity }
    }
}

impl<T: AsyncRead + Unpin> AsyncRead for TrackedStream<T> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let result = Pin::new(&mut this.inner).poll_read(cx, buf);
        if matches!(result, Poll::Ready(Ok(()))) && buf.filled().len() > before {
            this.activity.on_read();
        }
        result
    }
}

impl<T: AsyncWrite + Unpin> AsyncWrite for TrackedStream<T> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let result = Pin::new(&mut this.inner).poll_write(cx, buf);
        if matches!(result, Poll::Ready(Ok(n)) if n > 0) {
            this.activity.on_write();
        }
        result
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let result = Pin::new(&mut this.inner).poll_write_vectored(cx, bufs);
        if matches!(result, Poll::Ready(Ok(n)) if n > 0) {
            this.activity.on_write();
        }
        result
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_pending_between_request_and_response() {
        let (mut client, server) = tokio::io::duplex(256);
        let activity = ConnActivity::new();
        let mut server = TrackedStream::new(server, Rc::clone(&activity));
        assert!(!activity.is_pending());

        client.write_all(b"GET / HT").await.unwrap();
        let mut buf = [0u8; 64];
        let n = server.read(&mut buf).await.unwrap();
        assert_eq!(n, 8);
        assert!(activity.is_pending());

        server.write_all(b"HTTP/1.1 200 OK\r\n").await.unwrap();
        assert!(!activity.is_pending());
    }

    #[test]
    fn test_idle_deadline() {
        let activity = ConnActivity::new();
        let keep_alive = Duration::from_secs(5);

        activity.on_write();
        assert_eq!(activity.idle_deadline(keep_alive), activity.last.get() + keep_alive);

        // Pending connections are pushed out from now
        activity.on_read();
        let now = Instant::now();
        assert!(activity.idle_deadline(keep_alive) >= now + keep_alive);
    }
}
