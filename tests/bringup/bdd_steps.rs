//! BDD step definitions for `ksup kind` against fake cluster tools.

use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{BringupContext, CliOutput};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
    #[error("failed to execute ksup command: {0}")]
    Execution(String),
}

fn output_of(bringup_context: &BringupContext) -> Result<&CliOutput, StepError> {
    bringup_context
        .output
        .as_ref()
        .ok_or_else(|| StepError::Assertion(String::from("missing command output")))
}

fn assert_no_call(bringup_context: &BringupContext, fragment: &str) -> Result<(), StepError> {
    match bringup_context.call_index(fragment) {
        None => Ok(()),
        Some(_) => Err(StepError::Assertion(format!(
            "expected no call containing '{fragment}', got: {:?}",
            bringup_context.tools.calls()
        ))),
    }
}

#[given("fake cluster tools")]
fn fake_cluster_tools(bringup_context: BringupContext) -> BringupContext {
    bringup_context
}

#[given("calls matching \"{pattern}\" fail")]
fn calls_matching_fail(mut bringup_context: BringupContext, pattern: String) -> BringupContext {
    bringup_context.fail_match = Some(pattern);
    bringup_context
}

#[given("image sync failures abort the bring-up")]
fn sync_failures_abort(mut bringup_context: BringupContext) -> BringupContext {
    bringup_context.abort_on_sync_failure = true;
    bringup_context
}

#[given("a reset onto nightly \"{token}\"")]
fn reset_onto_nightly(mut bringup_context: BringupContext, token: String) -> BringupContext {
    bringup_context
        .extra_args
        .extend([String::from("--reset"), String::from("--nightly"), token]);
    bringup_context
}

#[when("I bring up the cluster \"{name}\"")]
fn bring_up_cluster(
    mut bringup_context: BringupContext,
    name: String,
) -> Result<BringupContext, StepError> {
    let mut cmd = bringup_context.base_command();
    cmd.args(["kind", "--name", name.as_str()]);
    cmd.args(&bringup_context.extra_args);
    let output = cmd
        .output()
        .map_err(|err| StepError::Execution(err.to_string()))?;

    bringup_context.output = Some(CliOutput::from_process_output(output));
    Ok(bringup_context)
}

#[then("the bring-up succeeds")]
fn bringup_succeeds(bringup_context: &BringupContext) -> Result<(), StepError> {
    let output = output_of(bringup_context)?;
    if output.status_code != 0 {
        return Err(StepError::Assertion(format!(
            "expected success, got exit {} with stderr: {}",
            output.status_code, output.stderr
        )));
    }
    Ok(())
}

#[then("the bring-up fails mentioning \"{text}\"")]
fn bringup_fails(bringup_context: &BringupContext, text: String) -> Result<(), StepError> {
    let output = output_of(bringup_context)?;
    if output.status_code != 1 {
        return Err(StepError::Assertion(format!(
            "expected exit status 1, got {}",
            output.status_code
        )));
    }
    if !output.stderr.contains(&text) {
        return Err(StepError::Assertion(format!(
            "expected stderr to contain '{text}', got: {}",
            output.stderr
        )));
    }
    Ok(())
}

#[then("the call \"{first}\" runs before \"{second}\"")]
fn call_runs_before(
    bringup_context: &BringupContext,
    first: String,
    second: String,
) -> Result<(), StepError> {
    let calls = bringup_context.tools.calls();
    let (Some(first_index), Some(second_index)) = (
        bringup_context.call_index(&first),
        bringup_context.call_index(&second),
    ) else {
        return Err(StepError::Assertion(format!(
            "expected calls containing '{first}' and '{second}', got: {calls:?}"
        )));
    };
    if first_index >= second_index {
        return Err(StepError::Assertion(format!(
            "expected '{first}' before '{second}', got: {calls:?}"
        )));
    }
    Ok(())
}

#[then("the image pull policy hint is printed")]
fn pull_policy_hint_printed(bringup_context: &BringupContext) -> Result<(), StepError> {
    let output = output_of(bringup_context)?;
    if output.stdout.contains("imagePullPolicy") {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected the pull policy hint on stdout, got: {}",
            output.stdout
        )))
    }
}

#[then("the failure summary lists \"{entry}\"")]
fn failure_summary_lists(bringup_context: &BringupContext, entry: String) -> Result<(), StepError> {
    let output = output_of(bringup_context)?;
    if output.stderr.contains("image(s) failed to sync") && output.stderr.contains(&entry) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected the failure summary to list '{entry}', got: {}",
            output.stderr
        )))
    }
}

#[then("no image is pulled")]
fn no_image_pulled(bringup_context: &BringupContext) -> Result<(), StepError> {
    assert_no_call(bringup_context, "docker pull")
}

#[then("no manifest is applied")]
fn no_manifest_applied(bringup_context: &BringupContext) -> Result<(), StepError> {
    assert_no_call(bringup_context, "kubectl apply")
}

#[then("no reset is run")]
fn no_reset_run(bringup_context: &BringupContext) -> Result<(), StepError> {
    assert_no_call(bringup_context, "com reset")
}
