//! Enabling and disabling platform components.
//!
//! A component is switched by a JSON Patch against the platform's
//! `ClusterConfiguration` resource, applied through the manifest tool.
//! SonarQube is wired in through the console's config map instead, and the
//! whole configuration can be opened in an editor.

use std::fmt;
use std::str::FromStr;

use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::command::{CommandError, CommandRunner, CommandSpec};

/// Namespace holding the platform installer.
pub const PLATFORM_NAMESPACE: &str = "kubesphere-system";

/// Name of the `ClusterConfiguration` resource that is patched.
pub const CLUSTER_CONFIGURATION_NAME: &str = "ks-installer";

/// Config map holding the console settings that point at SonarQube.
pub const CONSOLE_CONFIG_NAME: &str = "ks-console-config";

/// Components whose `enabled` switch can be patched.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PlatformComponent {
    /// CI/CD pipelines.
    DevOps,
    /// Alerting rules and notifications.
    Alerting,
    /// API audit logging.
    Auditing,
    /// Kubernetes event archiving.
    Events,
    /// Log collection.
    Logging,
    /// The metrics server.
    MetricsServer,
    /// Network policy management.
    NetworkPolicy,
    /// The notification manager.
    Notification,
    /// The application store.
    OpenPitrix,
    /// The service mesh.
    ServiceMesh,
}

impl PlatformComponent {
    /// Every patchable component.
    pub const ALL: [Self; 10] = [
        Self::DevOps,
        Self::Alerting,
        Self::Auditing,
        Self::Events,
        Self::Logging,
        Self::MetricsServer,
        Self::NetworkPolicy,
        Self::Notification,
        Self::OpenPitrix,
        Self::ServiceMesh,
    ];

    /// Key of the component under `/spec` in the cluster configuration.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DevOps => "devops",
            Self::Alerting => "alerting",
            Self::Auditing => "auditing",
            Self::Events => "events",
            Self::Logging => "logging",
            Self::MetricsServer => "metrics_server",
            Self::NetworkPolicy => "networkpolicy",
            Self::Notification => "notification",
            Self::OpenPitrix => "openpitrix",
            Self::ServiceMesh => "servicemesh",
        }
    }
}

impl fmt::Display for PlatformComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlatformComponent {
    type Err = ToggleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|component| component.name() == name)
            .ok_or_else(|| ToggleError::UnknownComponent {
                name: name.to_owned(),
            })
    }
}

/// Errors raised while toggling a component.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ToggleError {
    /// Raised for a name that is not a patchable component.
    #[error("unknown component {name:?}; supported components: {}", supported_names())]
    UnknownComponent {
        /// Name that was requested.
        name: String,
    },
    /// Raised when the SonarQube integration lacks its URL or token.
    #[error("SonarQube URL or token is empty; provide --sonarqube and --sonarqube-token")]
    MissingSonarQube,
    /// Raised when the patch command fails.
    #[error("failed to patch component {component}: {source}")]
    Patch {
        /// Component being switched.
        component: PlatformComponent,
        /// Underlying command failure.
        #[source]
        source: CommandError,
    },
    /// Raised when the console config map cannot be patched.
    #[error("failed to integrate SonarQube: {source}")]
    Integration {
        /// Underlying command failure.
        #[source]
        source: CommandError,
    },
    /// Raised when the editor session fails.
    #[error("failed to edit the cluster configuration: {source}")]
    Edit {
        /// Underlying command failure.
        #[source]
        source: CommandError,
    },
}

/// What `ksup enable` was asked to switch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ToggleTarget {
    /// A component with an `enabled` switch.
    Component(PlatformComponent),
    /// The SonarQube integration (`sonarqube` or `sonar`).
    SonarQube,
}

impl FromStr for ToggleTarget {
    type Err = ToggleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "sonarqube" | "sonar" => Ok(Self::SonarQube),
            other => other.parse().map(Self::Component),
        }
    }
}

/// Address and token of a SonarQube server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SonarQubeEndpoint {
    url: String,
    token: String,
}

impl SonarQubeEndpoint {
    /// Validates that both the URL and the token are present.
    ///
    /// # Errors
    ///
    /// Returns [`ToggleError::MissingSonarQube`] when either value is blank.
    pub fn new(url: &str, token: &str) -> Result<Self, ToggleError> {
        let (url, token) = (url.trim(), token.trim());
        if url.is_empty() || token.is_empty() {
            return Err(ToggleError::MissingSonarQube);
        }
        Ok(Self {
            url: url.to_owned(),
            token: token.to_owned(),
        })
    }

    /// The server URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// One `ksup enable` invocation, validated before any tool runs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EnableAction {
    /// Open the cluster configuration in an editor.
    Edit,
    /// Set a component's `enabled` switch.
    Switch {
        /// Component being switched.
        component: PlatformComponent,
        /// Desired value of the switch.
        enabled: bool,
    },
    /// Point the console at a SonarQube server.
    SonarQube(SonarQubeEndpoint),
}

fn supported_names() -> String {
    PlatformComponent::ALL
        .map(PlatformComponent::name)
        .join(", ")
}

/// Builds the JSON Patch document that sets the component's switch.
#[must_use]
pub fn enabled_patch(component: PlatformComponent, enabled: bool) -> String {
    json!([{
        "op": "replace",
        "path": format!("/spec/{}/enabled", component.name()),
        "value": enabled,
    }])
    .to_string()
}

/// Builds the merge patch that points the console at `endpoint`.
#[must_use]
pub fn sonarqube_patch(endpoint: &SonarQubeEndpoint) -> String {
    json!({
        "data": {
            "sonarqubeURL": endpoint.url,
            "sonarqubeToken": endpoint.token,
        }
    })
    .to_string()
}

/// Applies component switches through `kubectl patch`.
#[derive(Clone, Debug)]
pub struct ComponentToggler<R> {
    runner: R,
    kubectl_bin: String,
}

impl<R: CommandRunner> ComponentToggler<R> {
    /// Creates a toggler that invokes `kubectl_bin`.
    #[must_use]
    pub fn new(runner: R, kubectl_bin: impl Into<String>) -> Self {
        Self {
            runner,
            kubectl_bin: kubectl_bin.into(),
        }
    }

    /// The patch command for one component.
    #[must_use]
    pub fn patch_command(&self, component: PlatformComponent, enabled: bool) -> CommandSpec {
        CommandSpec::new(&self.kubectl_bin)
            .args(["-n", PLATFORM_NAMESPACE, "patch", "clusterconfiguration"])
            .arg(CLUSTER_CONFIGURATION_NAME)
            .arg("--type=json")
            .arg("-p")
            .arg(enabled_patch(component, enabled))
    }

    /// Enables `component`, or disables it when `enabled` is false.
    ///
    /// # Errors
    ///
    /// Returns [`ToggleError::Patch`] when the patch command fails.
    pub fn toggle(&self, component: PlatformComponent, enabled: bool) -> Result<(), ToggleError> {
        info!(%component, enabled, "patching cluster configuration");
        self.runner
            .run_checked(&self.patch_command(component, enabled))
            .map_err(|source| ToggleError::Patch { component, source })
    }

    /// The patch command for the console config map.
    #[must_use]
    pub fn sonarqube_command(&self, endpoint: &SonarQubeEndpoint) -> CommandSpec {
        CommandSpec::new(&self.kubectl_bin)
            .args(["-n", PLATFORM_NAMESPACE, "patch", "configmap"])
            .arg(CONSOLE_CONFIG_NAME)
            .arg("--type=merge")
            .arg("-p")
            .arg(sonarqube_patch(endpoint))
    }

    /// Points the console at the SonarQube server in `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ToggleError::Integration`] when the patch command fails.
    pub fn integrate_sonarqube(&self, endpoint: &SonarQubeEndpoint) -> Result<(), ToggleError> {
        info!(url = endpoint.url(), "patching console configuration");
        self.runner
            .run_checked(&self.sonarqube_command(endpoint))
            .map_err(|source| ToggleError::Integration { source })
    }

    /// The command that opens the cluster configuration in an editor.
    #[must_use]
    pub fn edit_command(&self) -> CommandSpec {
        CommandSpec::new(&self.kubectl_bin)
            .args(["-n", PLATFORM_NAMESPACE, "edit", "clusterconfiguration"])
            .arg(CLUSTER_CONFIGURATION_NAME)
    }

    /// Opens the cluster configuration in the user's editor.
    ///
    /// # Errors
    ///
    /// Returns [`ToggleError::Edit`] when the editor session fails.
    pub fn edit(&self) -> Result<(), ToggleError> {
        info!("editing cluster configuration");
        self.runner
            .run_interactive(&self.edit_command())
            .map_err(|source| ToggleError::Edit { source })
    }

    /// Carries out one validated `ksup enable` action.
    ///
    /// # Errors
    ///
    /// Returns the error of whichever command the action runs.
    pub fn apply(&self, action: &EnableAction) -> Result<(), ToggleError> {
        match action {
            EnableAction::Edit => self.edit(),
            EnableAction::Switch { component, enabled } => self.toggle(*component, *enabled),
            EnableAction::SonarQube(endpoint) => self.integrate_sonarqube(endpoint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedRunner;
    use rstest::rstest;
    use serde_json::Value;

    #[rstest]
    #[case("devops", PlatformComponent::DevOps)]
    #[case("metrics_server", PlatformComponent::MetricsServer)]
    #[case(" servicemesh ", PlatformComponent::ServiceMesh)]
    fn parses_component_names(#[case] raw: &str, #[case] expected: PlatformComponent) {
        assert_eq!(raw.parse::<PlatformComponent>(), Ok(expected));
    }

    #[rstest]
    fn every_component_round_trips_by_name() {
        for component in PlatformComponent::ALL {
            assert_eq!(component.name().parse::<PlatformComponent>(), Ok(component));
        }
    }

    fn args_of(runner: &ScriptedRunner) -> Vec<String> {
        let invocations = runner.invocations();
        let [invocation] = invocations.as_slice() else {
            panic!("expected one invocation, got {invocations:?}");
        };
        invocation
            .args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[rstest]
    #[case("sonarqube")]
    #[case(" sonar ")]
    fn sonarqube_names_select_the_integration(#[case] raw: &str) {
        assert_eq!(raw.parse::<ToggleTarget>(), Ok(ToggleTarget::SonarQube));
        assert!(raw.parse::<PlatformComponent>().is_err());
    }

    #[rstest]
    fn toggle_target_wraps_components() {
        assert_eq!(
            "logging".parse::<ToggleTarget>(),
            Ok(ToggleTarget::Component(PlatformComponent::Logging))
        );
    }

    #[rstest]
    #[case("", "token")]
    #[case("http://sonar.local", "")]
    #[case("  ", "  ")]
    fn sonarqube_endpoint_needs_url_and_token(#[case] url: &str, #[case] token: &str) {
        assert_eq!(
            SonarQubeEndpoint::new(url, token),
            Err(ToggleError::MissingSonarQube)
        );
    }

    #[rstest]
    fn sonarqube_patch_sets_console_data() {
        let endpoint = SonarQubeEndpoint::new("http://sonar.local:9000", "s3cr3t")
            .expect("endpoint should validate");
        let patch: Value =
            serde_json::from_str(&sonarqube_patch(&endpoint)).expect("patch is json");
        assert_eq!(
            patch,
            json!({"data": {"sonarqubeURL": "http://sonar.local:9000", "sonarqubeToken": "s3cr3t"}})
        );
    }

    #[rstest]
    fn sonarqube_action_patches_console_config() {
        let runner = ScriptedRunner::new();
        let toggler = ComponentToggler::new(runner.clone(), "kubectl");
        let endpoint = SonarQubeEndpoint::new("http://sonar.local", "tok")
            .expect("endpoint should validate");

        toggler
            .apply(&EnableAction::SonarQube(endpoint.clone()))
            .expect("integration should succeed");

        let args = args_of(&runner);
        assert_eq!(
            args.get(..6),
            Some(
                [
                    "-n",
                    "kubesphere-system",
                    "patch",
                    "configmap",
                    "ks-console-config",
                    "--type=merge",
                ]
                .map(String::from)
                .as_slice()
            )
        );
        assert_eq!(args.get(7), Some(&sonarqube_patch(&endpoint)));
    }

    #[rstest]
    fn failed_integration_is_reported() {
        let runner = ScriptedRunner::new();
        runner.fail_matching("patch configmap", 1);
        let toggler = ComponentToggler::new(runner, "kubectl");
        let endpoint = SonarQubeEndpoint::new("http://sonar.local", "tok")
            .expect("endpoint should validate");

        let err = toggler
            .integrate_sonarqube(&endpoint)
            .expect_err("patch failure should surface");

        assert!(matches!(err, ToggleError::Integration { .. }));
        assert!(err.to_string().starts_with("failed to integrate SonarQube"));
    }

    #[rstest]
    fn edit_action_opens_cluster_configuration() {
        let runner = ScriptedRunner::new();
        let toggler = ComponentToggler::new(runner.clone(), "kubectl");

        toggler
            .apply(&EnableAction::Edit)
            .expect("edit should succeed");

        assert_eq!(
            args_of(&runner),
            [
                "-n",
                "kubesphere-system",
                "edit",
                "clusterconfiguration",
                "ks-installer"
            ]
            .map(String::from)
        );
    }

    #[rstest]
    fn failed_edit_is_reported() {
        let runner = ScriptedRunner::new();
        runner.fail_matching("edit clusterconfiguration", 1);
        let toggler = ComponentToggler::new(runner, "kubectl");

        let err = toggler.edit().expect_err("editor failure should surface");

        assert!(matches!(
            err,
            ToggleError::Edit {
                source: CommandError::Exit { .. }
            }
        ));
    }

    #[rstest]
    fn unknown_component_lists_supported_names() {
        let err = "kubeedge"
            .parse::<PlatformComponent>()
            .expect_err("kubeedge is not patchable");
        let message = err.to_string();
        assert!(message.contains("kubeedge"));
        assert!(message.contains("metrics_server, networkpolicy"));
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn patch_replaces_enabled_switch(#[case] enabled: bool) {
        let patch: Value = serde_json::from_str(&enabled_patch(PlatformComponent::Logging, enabled))
            .expect("patch is json");
        assert_eq!(
            patch,
            json!([{"op": "replace", "path": "/spec/logging/enabled", "value": enabled}])
        );
    }

    #[rstest]
    fn toggle_patches_cluster_configuration() {
        let runner = ScriptedRunner::new();
        let toggler = ComponentToggler::new(runner.clone(), "kubectl");

        toggler
            .toggle(PlatformComponent::DevOps, false)
            .expect("patch should succeed");

        let invocations = runner.invocations();
        let [invocation] = invocations.as_slice() else {
            panic!("expected one invocation, got {invocations:?}");
        };
        let args: Vec<String> = invocation
            .args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(invocation.program, "kubectl");
        assert_eq!(
            args.get(..6),
            Some(
                [
                    "-n",
                    "kubesphere-system",
                    "patch",
                    "clusterconfiguration",
                    "ks-installer",
                    "--type=json",
                ]
                .map(String::from)
                .as_slice()
            )
        );
        assert_eq!(args.get(6).map(String::as_str), Some("-p"));
        assert_eq!(
            args.get(7),
            Some(&enabled_patch(PlatformComponent::DevOps, false))
        );
    }

    #[rstest]
    fn failed_patch_names_the_component() {
        let runner = ScriptedRunner::new();
        runner.fail_matching("patch clusterconfiguration", 1);
        let toggler = ComponentToggler::new(runner, "kubectl");

        let err = toggler
            .toggle(PlatformComponent::Events, true)
            .expect_err("patch failure should surface");

        assert!(matches!(
            err,
            ToggleError::Patch {
                component: PlatformComponent::Events,
                source: CommandError::Exit { .. },
            }
        ));
    }
}
