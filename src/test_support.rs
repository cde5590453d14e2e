//! Test support utilities shared across unit and integration tests.

use std::ffi::OsString;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::command::{
    CommandError, CommandOutcome, CommandRunner, CommandSpec, RelayFailure, StreamKind,
};

/// Records a single invocation made through [`ScriptedRunner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandInvocation {
    /// Program name as passed to the runner.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
}

impl CommandInvocation {
    /// Returns a shell-like command string for assertions.
    #[must_use]
    pub fn command_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(
            self.args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }
}

/// Response returned for commands matching a scripted rule.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScriptedResponse {
    /// The command launches and exits with this code.
    Exit(i32),
    /// The command cannot be launched.
    SpawnFailure,
    /// The command exits zero but the relay of this stream fails.
    RelayFailure(StreamKind),
}

#[derive(Clone, Debug)]
struct Rule {
    pattern: String,
    response: ScriptedResponse,
}

#[derive(Debug, Default)]
struct State {
    rules: Vec<Rule>,
    invocations: Vec<CommandInvocation>,
    delay: Option<Duration>,
}

/// Thread-safe scripted command runner.
///
/// Commands succeed unless their rendered command string contains the
/// pattern of a registered rule; the first matching rule decides the
/// response. Every invocation is recorded in call order, across clones and
/// threads.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    state: Arc<Mutex<State>>,
}

impl ScriptedRunner {
    /// Creates a runner where every command succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push_rule(&self, pattern: &str, response: ScriptedResponse) {
        self.lock().rules.push(Rule {
            pattern: pattern.to_owned(),
            response,
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes commands containing `pattern` exit with `code`.
    pub fn fail_matching(&self, pattern: &str, code: i32) {
        self.push_rule(pattern, ScriptedResponse::Exit(code));
    }

    /// Makes commands containing `pattern` fail to launch.
    pub fn spawn_failure_matching(&self, pattern: &str) {
        self.push_rule(pattern, ScriptedResponse::SpawnFailure);
    }

    /// Makes commands containing `pattern` report a relay failure on
    /// `stream` despite exiting zero.
    pub fn relay_failure_matching(&self, pattern: &str, stream: StreamKind) {
        self.push_rule(pattern, ScriptedResponse::RelayFailure(stream));
    }

    /// Makes every command take `delay` before completing.
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    /// Returns a snapshot of all invocations recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.lock().invocations.clone()
    }

    /// Returns the recorded invocations rendered as command strings.
    #[must_use]
    pub fn command_strings(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .map(CommandInvocation::command_string)
            .collect()
    }

    /// Position of the first recorded command equal to `command`.
    #[must_use]
    pub fn position_of(&self, command: &str) -> Option<usize> {
        self.command_strings()
            .iter()
            .position(|recorded| recorded == command)
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutcome, CommandError> {
        let invocation = CommandInvocation {
            program: command.program().to_owned(),
            args: command.arguments().to_vec(),
        };
        let rendered = invocation.command_string();

        let (response, delay) = {
            let mut state = self.lock();
            state.invocations.push(invocation);
            let response = state
                .rules
                .iter()
                .find(|rule| rendered.contains(&rule.pattern))
                .map_or(ScriptedResponse::Exit(0), |rule| rule.response.clone());
            (response, state.delay)
        };

        if let Some(pause) = delay {
            thread::sleep(pause);
        }

        let program = command.program().to_owned();
        match response {
            ScriptedResponse::Exit(code) => Ok(CommandOutcome::exited(program, code)),
            ScriptedResponse::SpawnFailure => Err(CommandError::Spawn {
                program,
                message: String::from("simulated spawn failure"),
            }),
            ScriptedResponse::RelayFailure(stream) => {
                let failure = Some(RelayFailure {
                    stream,
                    message: String::from("simulated relay failure"),
                });
                let (stdout_relay, stderr_relay) = match stream {
                    StreamKind::Stdout => (failure, None),
                    StreamKind::Stderr => (None, failure),
                };
                Ok(CommandOutcome {
                    program,
                    code: Some(0),
                    stdout_relay,
                    stderr_relay,
                })
            }
        }
    }
}
