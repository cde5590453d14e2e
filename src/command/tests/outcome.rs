//! Tests for outcome folding and command rendering.

use rstest::rstest;

use super::super::*;

fn relay_failure(stream: StreamKind) -> Option<RelayFailure> {
    Some(RelayFailure {
        stream,
        message: String::from("broken pipe"),
    })
}

#[rstest]
fn exit_failure_takes_precedence_over_relay_failures() {
    let outcome = CommandOutcome {
        program: String::from("kind"),
        code: Some(2),
        stdout_relay: relay_failure(StreamKind::Stdout),
        stderr_relay: relay_failure(StreamKind::Stderr),
    };

    assert_eq!(outcome.relay_errors().len(), 2);
    assert!(matches!(
        outcome.into_result(),
        Err(CommandError::Exit { status: Some(2), .. })
    ));
}

#[rstest]
fn secondary_relay_failure_is_not_discarded() {
    let outcome = CommandOutcome {
        program: String::from("kind"),
        code: Some(0),
        stdout_relay: None,
        stderr_relay: relay_failure(StreamKind::Stderr),
    };

    assert!(outcome.exited_successfully());
    assert!(!outcome.is_success());
    assert_eq!(
        outcome.into_result(),
        Err(CommandError::Relay {
            program: String::from("kind"),
            stream: StreamKind::Stderr,
            message: String::from("broken pipe"),
        })
    );
}

#[rstest]
fn signalled_exit_is_a_failure() {
    let outcome = CommandOutcome {
        program: String::from("docker"),
        code: None,
        stdout_relay: None,
        stderr_relay: None,
    };

    let err = outcome.exit_error().expect("signal should be an exit failure");
    assert_eq!(err.to_string(), "docker exited with status signal");
}

#[rstest]
fn clean_outcome_folds_to_ok() {
    assert_eq!(CommandOutcome::exited("kubectl", 0).into_result(), Ok(()));
}

#[rstest]
#[case(CommandSpec::new("docker").args(["pull", "alpine"]), "docker pull alpine")]
#[case(CommandSpec::new("sh").arg("-c").arg("exit 1"), "sh -c 'exit 1'")]
fn command_string_is_shell_escaped(#[case] command: CommandSpec, #[case] expected: &str) {
    assert_eq!(command.command_string(), expected);
    assert_eq!(command.to_string(), expected);
}
