use bytes::Bytes;
use std::io::{self, Write};
use tokio::sync::mpsc;

/// A blocking [`Write`] sink that forwards each flushed unit as one
/// [`Bytes`] chunk over an unbounded channel.
///
/// This is what lets the chunked writer (blocking, driven from the emission
/// task) feed an async response body: the receiving half is turned into a
/// stream by the HTTP layer. Writes are buffered until [`flush`], so a record
/// written with several `write` calls still becomes a single chunk.
///
/// Once the receiver is dropped (the client went away) every write and flush
/// fails with [`io::ErrorKind::BrokenPipe`].
///
/// [`flush`]: Write::flush
#[derive(Debug)]
pub struct ChannelWriter {
    buf: Vec<u8>,
    tx: mpsc::UnboundedSender<Bytes>,
}

impl ChannelWriter {
    pub const fn new(tx: mpsc::UnboundedSender<Bytes>) -> Self {
        Self { buf: Vec::new(), tx }
    }

    /// Creates a writer together with the receiver of its chunks.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn broken_pipe() -> io::Error {
        io::Error::new(io::ErrorKind::BrokenPipe, "chunk receiver dropped")
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.tx.is_closed() {
            return Err(Self::broken_pipe());
        }
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = Bytes::from(core::mem::take(&mut self.buf));
        self.tx.send(chunk).map_err(|_| Self::broken_pipe())
    }
}

impl Drop for ChannelWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
