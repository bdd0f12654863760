//! In-memory unbuffered pipe
//!
//! Connects a [`Write`] on one thread to a [`Read`] on another. The chunk
//! channel has no capacity, and a write only returns once the reader has
//! consumed the whole chunk (or gone away), so the writer can never run
//! ahead of the reader.
//!
//! - Dropping the [`PipeWriter`] ends the stream: the reader sees `Ok(0)`.
//! - Writing after the [`PipeReader`] is gone fails with `BrokenPipe`.
//! - If the reader is dropped halfway through a chunk, the pending write
//!   reports how many bytes were actually consumed.

use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, SyncSender};

/// Create a connected writer/reader pair
pub fn pipe() -> (PipeWriter, PipeReader) {
    let (chunk_tx, chunk_rx) = mpsc::sync_channel(0);
    let (ack_tx, ack_rx) = mpsc::sync_channel(1);

    let writer = PipeWriter {
        chunks: chunk_tx,
        acks: ack_rx,
    };
    let reader = PipeReader {
        chunks: chunk_rx,
        acks: ack_tx,
        current: Vec::new(),
        pos: 0,
        pending: false,
    };
    (writer, reader)
}

/// Write end of a [`pipe`]
#[derive(Debug)]
pub struct PipeWriter {
    chunks: SyncSender<Vec<u8>>,
    acks: Receiver<usize>,
}

/// Read end of a [`pipe`]
#[derive(Debug)]
pub struct PipeReader {
    chunks: Receiver<Vec<u8>>,
    acks: SyncSender<usize>,
    current: Vec<u8>,
    pos: usize,
    /// A writer is blocked waiting for `current` to be consumed
    pending: bool,
}

fn closed_pipe() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "read end of pipe closed")
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        self.chunks.send(buf.to_vec()).map_err(|_| closed_pipe())?;

        match self.acks.recv() {
            Ok(0) | Err(_) => Err(closed_pipe()),
            Ok(n) => Ok(n),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl PipeReader {
    fn acknowledge(&mut self) {
        if self.pending {
            self.pending = false;
            // The writer may already have given up; nothing to report then
            let _ = self.acks.send(self.pos);
        }
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if !self.pending {
            match self.chunks.recv() {
                Ok(chunk) => {
                    self.current = chunk;
                    self.pos = 0;
                    self.pending = true;
                }
                // Every writer is gone: end of stream
                Err(_) => return Ok(0),
            }
        }

        let remaining = &self.current[self.pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;

        if self.pos == self.current.len() {
            self.acknowledge();
        }
        Ok(n)
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        self.acknowledge();
    }
}
