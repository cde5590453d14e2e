//! Destinations for relayed process output.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Supplies the writers that receive a child's standard output and standard
/// error.
///
/// A fresh pair of writers is requested for every command so each relay owns
/// its sink for the lifetime of the process.
pub trait OutputSinks {
    /// Writer receiving the child's standard output.
    type Stdout: Write + Send;
    /// Writer receiving the child's standard error.
    type Stderr: Write + Send;

    /// Returns the sink for standard output.
    fn stdout(&self) -> Self::Stdout;

    /// Returns the sink for standard error.
    fn stderr(&self) -> Self::Stderr;
}

/// Forwards child output to this process's own standard streams.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessSinks;

impl OutputSinks for ProcessSinks {
    type Stdout = io::Stdout;
    type Stderr = io::Stderr;

    fn stdout(&self) -> Self::Stdout {
        io::stdout()
    }

    fn stderr(&self) -> Self::Stderr {
        io::stderr()
    }
}

/// Growable byte buffer shared between clones.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything written so far.
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns everything written so far, decoded lossily as UTF-8.
    #[must_use]
    pub fn contents_lossy(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Captures child output in memory instead of forwarding it.
///
/// Every command run through the same sinks appends to the same buffers.
#[derive(Clone, Debug, Default)]
pub struct CaptureSinks {
    stdout: SharedBuffer,
    stderr: SharedBuffer,
}

impl CaptureSinks {
    /// Creates sinks with empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes captured from standard output.
    #[must_use]
    pub fn stdout_bytes(&self) -> Vec<u8> {
        self.stdout.contents()
    }

    /// Bytes captured from standard error.
    #[must_use]
    pub fn stderr_bytes(&self) -> Vec<u8> {
        self.stderr.contents()
    }
}

impl OutputSinks for CaptureSinks {
    type Stdout = SharedBuffer;
    type Stderr = SharedBuffer;

    fn stdout(&self) -> Self::Stdout {
        self.stdout.clone()
    }

    fn stderr(&self) -> Self::Stderr {
        self.stderr.clone()
    }
}
