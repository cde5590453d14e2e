//! Chunked byte relay from a readable stream to a writable sink.
//!
//! A relay forwards every chunk as soon as it is read and flushes the sink
//! after each write, so output from long-running tools reaches the terminal
//! while the tool is still running. End-of-stream finishes the relay; any
//! other read failure, or any write failure, stops it at once. Bytes already
//! forwarded before a failure stay forwarded.

use std::io::{self, Read, Write};
use std::num::NonZeroUsize;

/// Chunk size used by [`StreamRelay::default`].
pub const DEFAULT_CHUNK_SIZE: NonZeroUsize = match NonZeroUsize::new(8 * 1024) {
    Some(size) => size,
    None => NonZeroUsize::MIN,
};

/// Copies bytes from a source to a sink in bounded chunks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StreamRelay {
    chunk_size: NonZeroUsize,
}

impl Default for StreamRelay {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl StreamRelay {
    /// Creates a relay that reads at most `chunk_size` bytes per read call.
    #[must_use]
    pub const fn new(chunk_size: NonZeroUsize) -> Self {
        Self { chunk_size }
    }

    /// Forwards `source` into `sink` until the source is exhausted and
    /// returns the number of bytes forwarded.
    ///
    /// Interrupted reads are retried.
    ///
    /// # Errors
    ///
    /// Returns the first read error (other than an interruption) or the first
    /// write or flush error raised by the sink.
    pub fn copy<R, W>(&self, source: &mut R, sink: &mut W) -> io::Result<u64>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let mut buffer = vec![0_u8; self.chunk_size.get()];
        let mut forwarded: u64 = 0;

        loop {
            let read = match source.read(&mut buffer) {
                Ok(0) => return Ok(forwarded),
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };

            let chunk = buffer
                .get(..read)
                .ok_or_else(|| io::Error::other("reader reported more bytes than requested"))?;
            sink.write_all(chunk)?;
            sink.flush()?;
            forwarded = forwarded.saturating_add(u64::try_from(read).unwrap_or(u64::MAX));
        }
    }
}
