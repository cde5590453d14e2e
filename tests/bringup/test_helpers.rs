//! Shared fixtures for bring-up behavioural tests.

use std::process::Output;
use std::sync::Arc;

use rstest::fixture;

use crate::common::FakeTools;

#[derive(Clone, Debug)]
pub struct CliOutput {
    pub status_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CliOutput {
    pub fn from_process_output(output: Output) -> Self {
        let Output {
            status,
            stdout: raw_stdout,
            stderr: raw_stderr,
        } = output;
        Self {
            status_code: status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&raw_stdout).into_owned(),
            stderr: String::from_utf8_lossy(&raw_stderr).into_owned(),
        }
    }
}

/// State threaded through one bring-up scenario.
#[derive(Clone, Debug)]
pub struct BringupContext {
    pub tools: Arc<FakeTools>,
    pub fail_match: Option<String>,
    pub abort_on_sync_failure: bool,
    pub extra_args: Vec<String>,
    pub output: Option<CliOutput>,
}

impl BringupContext {
    pub fn base_command(&self) -> assert_cmd::Command {
        let mut cmd = self.tools.command();
        if let Some(pattern) = &self.fail_match {
            cmd.env("FAKE_FAIL_MATCH", pattern);
        }
        if self.abort_on_sync_failure {
            cmd.env("KSUP_ABORT_ON_SYNC_FAILURE", "true");
        }
        cmd
    }

    /// Index of the first logged call containing `fragment`.
    pub fn call_index(&self, fragment: &str) -> Option<usize> {
        self.tools
            .calls()
            .iter()
            .position(|call| call.contains(fragment))
    }
}

#[fixture]
pub fn bringup_context() -> BringupContext {
    BringupContext {
        tools: Arc::new(FakeTools::new()),
        fail_match: None,
        abort_on_sync_failure: false,
        extra_args: Vec::new(),
        output: None,
    }
}
