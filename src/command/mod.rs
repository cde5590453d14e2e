//! External command execution with concurrent output relaying.
//!
//! Every command is launched with both output streams piped. Two relays
//! drain the pipes at the same time so a child that fills one pipe while the
//! other is being read can never stall; only once both relays have finished
//! is the child reaped. The exit status and the relay results are reported
//! together in a [`CommandOutcome`].

use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::thread::{self, ScopedJoinHandle};

use tracing::debug;

mod error;
mod relay;
mod sinks;
mod types;

pub use error::CommandError;
pub use relay::{DEFAULT_CHUNK_SIZE, StreamRelay};
pub use sinks::{CaptureSinks, OutputSinks, ProcessSinks, SharedBuffer};
pub use types::{CommandOutcome, CommandSpec, RelayFailure, StreamKind};

/// Abstraction over command execution to support fakes in tests.
pub trait CommandRunner {
    /// Runs `command` to completion, relaying its output.
    ///
    /// A non-zero exit is reported inside the returned outcome rather than as
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Spawn`] if the command cannot be started, or
    /// [`CommandError::Wait`] if its exit status cannot be collected.
    fn run(&self, command: &CommandSpec) -> Result<CommandOutcome, CommandError>;

    /// Runs `command` and treats anything but a clean, fully relayed exit as
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns the launch error, or the outcome folded by
    /// [`CommandOutcome::into_result`].
    fn run_checked(&self, command: &CommandSpec) -> Result<(), CommandError> {
        self.run(command)?.into_result()
    }

    /// Runs `command` attached to this process's terminal, for tools that
    /// prompt the user or open an editor.
    ///
    /// Runners that cannot hand over the terminal fall back to
    /// [`CommandRunner::run_checked`].
    ///
    /// # Errors
    ///
    /// Returns the launch error, or [`CommandError::Exit`] when the command
    /// does not exit zero.
    fn run_interactive(&self, command: &CommandSpec) -> Result<(), CommandError> {
        self.run_checked(command)
    }
}

/// Runs real processes, forwarding their output to a pair of sinks.
#[derive(Clone, Debug, Default)]
pub struct StreamingCommandRunner<S = ProcessSinks> {
    sinks: S,
    relay: StreamRelay,
}

impl StreamingCommandRunner<ProcessSinks> {
    /// Creates a runner that forwards output to this process's own stdout
    /// and stderr.
    #[must_use]
    pub fn new() -> Self {
        Self::with_sinks(ProcessSinks)
    }
}

impl<S: OutputSinks> StreamingCommandRunner<S> {
    /// Creates a runner that forwards output to `sinks`.
    #[must_use]
    pub fn with_sinks(sinks: S) -> Self {
        Self {
            sinks,
            relay: StreamRelay::default(),
        }
    }

    /// Overrides the relay used for both streams.
    #[must_use]
    pub const fn with_relay(mut self, relay: StreamRelay) -> Self {
        self.relay = relay;
        self
    }

    /// Returns the configured sinks.
    #[must_use]
    pub const fn sinks(&self) -> &S {
        &self.sinks
    }
}

impl<S: OutputSinks> CommandRunner for StreamingCommandRunner<S> {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutcome, CommandError> {
        let program = command.program().to_owned();
        debug!(command = %command, "launching");

        let mut child = Command::new(&program)
            .args(command.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| CommandError::Spawn {
                program: program.clone(),
                message: err.to_string(),
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_sink = self.sinks.stdout();
        let stderr_sink = self.sinks.stderr();
        let relay = self.relay;

        let (stdout_relay, stderr_relay) = thread::scope(|scope| {
            let out = scope.spawn(move || forward(relay, StreamKind::Stdout, stdout, stdout_sink));
            let err = scope.spawn(move || forward(relay, StreamKind::Stderr, stderr, stderr_sink));
            (
                join_relay(StreamKind::Stdout, out),
                join_relay(StreamKind::Stderr, err),
            )
        });

        let status = child.wait().map_err(|err| CommandError::Wait {
            program: program.clone(),
            message: err.to_string(),
        })?;
        debug!(command = %command, code = ?status.code(), "exited");

        Ok(CommandOutcome {
            program,
            code: status.code(),
            stdout_relay,
            stderr_relay,
        })
    }

    fn run_interactive(&self, command: &CommandSpec) -> Result<(), CommandError> {
        let program = command.program().to_owned();
        debug!(command = %command, "launching attached to the terminal");

        let status = Command::new(&program)
            .args(command.arguments())
            .status()
            .map_err(|err| CommandError::Spawn {
                program: program.clone(),
                message: err.to_string(),
            })?;
        debug!(command = %command, code = ?status.code(), "exited");

        CommandOutcome {
            program,
            code: status.code(),
            stdout_relay: None,
            stderr_relay: None,
        }
        .into_result()
    }
}

fn forward<R, W>(
    relay: StreamRelay,
    stream: StreamKind,
    source: Option<R>,
    mut sink: W,
) -> Option<RelayFailure>
where
    R: Read,
    W: Write,
{
    let Some(mut pipe) = source else {
        return Some(RelayFailure {
            stream,
            message: String::from("stream was not captured"),
        });
    };

    match relay.copy(&mut pipe, &mut sink) {
        Ok(_) => None,
        Err(err) => {
            // Keep draining so the child never blocks on a full pipe.
            io::copy(&mut pipe, &mut io::sink()).ok();
            Some(RelayFailure {
                stream,
                message: err.to_string(),
            })
        }
    }
}

fn join_relay(
    stream: StreamKind,
    handle: ScopedJoinHandle<'_, Option<RelayFailure>>,
) -> Option<RelayFailure> {
    handle.join().unwrap_or_else(|_| {
        Some(RelayFailure {
            stream,
            message: String::from("relay thread panicked"),
        })
    })
}

#[cfg(test)]
mod tests;
