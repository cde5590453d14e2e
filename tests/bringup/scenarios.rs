//! BDD scenarios for the cluster bring-up pipeline.

use rstest_bdd_macros::scenario;

use super::test_helpers::{BringupContext, bringup_context};

#[scenario(
    path = "tests/features/bringup.feature",
    name = "Run the bring-up steps in order"
)]
fn scenario_steps_in_order(bringup_context: BringupContext) {
    let _ = bringup_context;
}

#[scenario(
    path = "tests/features/bringup.feature",
    name = "Abort before any pull when cluster creation fails"
)]
fn scenario_create_failure(bringup_context: BringupContext) {
    let _ = bringup_context;
}

#[scenario(
    path = "tests/features/bringup.feature",
    name = "Report a failed image and keep going"
)]
fn scenario_image_failure_continues(bringup_context: BringupContext) {
    let _ = bringup_context;
}

#[scenario(
    path = "tests/features/bringup.feature",
    name = "Stop on a failed image under the abort policy"
)]
fn scenario_image_failure_aborts(bringup_context: BringupContext) {
    let _ = bringup_context;
}

#[scenario(
    path = "tests/features/bringup.feature",
    name = "Reset onto a dated nightly build"
)]
fn scenario_nightly_reset(bringup_context: BringupContext) {
    let _ = bringup_context;
}

#[scenario(
    path = "tests/features/bringup.feature",
    name = "Skip the reset for an unparseable nightly"
)]
fn scenario_unparseable_nightly(bringup_context: BringupContext) {
    let _ = bringup_context;
}
