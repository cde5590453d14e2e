//! Command descriptions and the outcome of running them.

use std::ffi::OsString;
use std::fmt;

use shell_escape::unix::escape;

use super::error::CommandError;

/// An external executable plus its ordered arguments.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandSpec {
    program: String,
    args: Vec<OsString>,
}

impl CommandSpec {
    /// Starts a command for `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments in order.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Executable name or path.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the executable.
    #[must_use]
    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    /// Renders the command as a shell-escaped string for logs and messages.
    #[must_use]
    pub fn command_string(&self) -> String {
        let mut rendered = String::from(escape(self.program.as_str().into()));
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(escape(arg.to_string_lossy()).as_ref());
        }
        rendered
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_string())
    }
}

/// Identifies one of a child's output streams.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StreamKind {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// A relay that stopped before its stream reached end-of-file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelayFailure {
    /// Stream whose relay failed.
    pub stream: StreamKind,
    /// Operating system error string.
    pub message: String,
}

/// Everything observed while running one command.
///
/// Output is not retained; it has already been forwarded to the sinks. The
/// exit status and both relay results are kept side by side so no failure is
/// lost, and [`CommandOutcome::into_result`] folds them into a single error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandOutcome {
    /// Program that was run.
    pub program: String,
    /// Exit code, or `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Failure of the standard output relay, if any.
    pub stdout_relay: Option<RelayFailure>,
    /// Failure of the standard error relay, if any.
    pub stderr_relay: Option<RelayFailure>,
}

impl CommandOutcome {
    /// Builds an outcome for a clean exit with the given code and no relay
    /// failures.
    #[must_use]
    pub fn exited(program: impl Into<String>, code: i32) -> Self {
        Self {
            program: program.into(),
            code: Some(code),
            stdout_relay: None,
            stderr_relay: None,
        }
    }

    /// Returns `true` when the process exited with status zero.
    #[must_use]
    pub const fn exited_successfully(&self) -> bool {
        matches!(self.code, Some(0))
    }

    /// Returns `true` when the process exited zero and both relays finished.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.exited_successfully() && self.stdout_relay.is_none() && self.stderr_relay.is_none()
    }

    /// Returns the exit failure, if the process did not exit zero.
    #[must_use]
    pub fn exit_error(&self) -> Option<CommandError> {
        if self.exited_successfully() {
            return None;
        }

        let status_text = self
            .code
            .map_or_else(|| String::from("signal"), |code| code.to_string());
        Some(CommandError::Exit {
            program: self.program.clone(),
            status: self.code,
            status_text,
        })
    }

    /// Returns every relay failure, standard output first.
    #[must_use]
    pub fn relay_errors(&self) -> Vec<CommandError> {
        [&self.stdout_relay, &self.stderr_relay]
            .into_iter()
            .flatten()
            .map(|failure| CommandError::Relay {
                program: self.program.clone(),
                stream: failure.stream,
                message: failure.message.clone(),
            })
            .collect()
    }

    /// Collapses the outcome into a single result.
    ///
    /// An exit failure takes precedence over relay failures, and a standard
    /// output relay failure over a standard error one.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Exit`] for a non-zero or signalled exit, or
    /// [`CommandError::Relay`] when the process exited zero but a relay did
    /// not finish.
    pub fn into_result(self) -> Result<(), CommandError> {
        if let Some(err) = self.exit_error() {
            return Err(err);
        }
        match self.relay_errors().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
