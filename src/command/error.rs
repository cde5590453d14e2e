//! Errors raised while running external commands.

use thiserror::Error;

use super::types::StreamKind;

/// Failures observed when launching, relaying, or reaping a process.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CommandError {
    /// Raised when the executable cannot be started.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Command that failed to start.
        program: String,
        /// Operating system error string.
        message: String,
    },
    /// Raised when the process exits non-zero or is killed by a signal.
    #[error("{program} exited with status {status_text}")]
    Exit {
        /// Command that failed.
        program: String,
        /// Exit code, or `None` when terminated by a signal.
        status: Option<i32>,
        /// Human readable representation of the exit status.
        status_text: String,
    },
    /// Raised when forwarding one of the output streams failed.
    #[error("relaying {stream} of {program} failed: {message}")]
    Relay {
        /// Command whose output was being relayed.
        program: String,
        /// Stream whose relay failed.
        stream: StreamKind,
        /// Operating system error string.
        message: String,
    },
    /// Raised when waiting for the process to exit fails.
    #[error("failed to wait for {program}: {message}")]
    Wait {
        /// Command being waited on.
        program: String,
        /// Operating system error string.
        message: String,
    },
}
