use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use procguard::output::Sink;
use tokio::io::AsyncWrite;

/// In-memory byte buffer that can be handed out as a sink and inspected
/// afterwards. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
    writes: Arc<Mutex<usize>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8(self.inner.lock().unwrap().clone()).expect("buffer holds UTF-8")
    }

    /// Number of write calls seen.
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    /// A blocking sink writing into this buffer.
    pub fn sink(&self) -> Sink {
        Sink::blocking(self.clone())
    }

    /// An async sink writing into this buffer.
    pub fn async_sink(&self) -> Sink {
        Sink::writer(self.clone())
    }

    fn push(&self, buf: &[u8]) {
        self.inner.lock().unwrap().extend_from_slice(buf);
        *self.writes.lock().unwrap() += 1;
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsyncWrite for SharedBuffer {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.push(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// A blocking writer that always fails, for relay failure tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrokenWriter;

impl io::Write for BrokenWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink is broken"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
