//! Requests, reports, and errors for the bring-up pipeline.

use std::fmt;

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::artifact::{ArtifactError, ArtifactRef, BatchReport, ComponentProfile};
use crate::command::CommandError;
use crate::kind_config::{KindConfigError, PortMappings};
use crate::nightly::NightlyTag;

/// Default kind cluster name.
pub const DEFAULT_CLUSTER_NAME: &str = "kind";

/// Default Kubernetes version, used as the node image tag.
pub const DEFAULT_KUBERNETES_VERSION: &str = "v1.18.2";

/// Default platform release whose manifests are applied.
pub const DEFAULT_PLATFORM_VERSION: &str = "v3.0.0";

/// Parameters of one local cluster bring-up.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BringupRequest {
    /// Name of the kind cluster.
    pub cluster_name: String,
    /// Kubernetes version of the node image.
    pub kubernetes_version: String,
    /// Ports exposed from the node container on the host.
    pub port_mappings: PortMappings,
    /// Platform release whose installer manifests are applied.
    pub platform_version: String,
    /// Optional components whose images are preloaded.
    pub components: Vec<ComponentProfile>,
    /// Whether to reset the platform onto a nightly build afterwards.
    pub reset: bool,
    /// Nightly token consumed by the reset.
    pub nightly: Option<String>,
}

impl Default for BringupRequest {
    fn default() -> Self {
        Self {
            cluster_name: DEFAULT_CLUSTER_NAME.to_owned(),
            kubernetes_version: DEFAULT_KUBERNETES_VERSION.to_owned(),
            port_mappings: PortMappings::new(),
            platform_version: DEFAULT_PLATFORM_VERSION.to_owned(),
            components: Vec::new(),
            reset: false,
            nightly: None,
        }
    }
}

impl BringupRequest {
    /// Parses component names, rejecting any without an image profile.
    ///
    /// Blank entries are ignored and repeated names are kept once.
    ///
    /// # Errors
    ///
    /// Returns [`BringupError::Component`] for the first unknown name.
    pub fn parse_components<I, S>(names: I) -> Result<Vec<ComponentProfile>, BringupError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut components = Vec::new();
        for entry in names {
            let name = entry.as_ref();
            if name.trim().is_empty() {
                continue;
            }
            let profile = name.parse::<ComponentProfile>()?;
            if !components.contains(&profile) {
                components.push(profile);
            }
        }
        Ok(components)
    }

    /// Ensures the textual fields are present.
    ///
    /// # Errors
    ///
    /// Returns [`BringupError::InvalidRequest`] naming the first blank field.
    pub fn validate(&self) -> Result<(), BringupError> {
        let fields = [
            ("cluster_name", &self.cluster_name),
            ("kubernetes_version", &self.kubernetes_version),
            ("platform_version", &self.platform_version),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(BringupError::InvalidRequest {
                    field: field.to_owned(),
                });
            }
        }
        Ok(())
    }
}

/// Sequential pipeline steps that run a single external command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BringupStep {
    /// `kind create cluster`.
    CreateCluster,
    /// `kubectl cluster-info`.
    VerifyReachability,
    /// `kubectl apply` of a remote manifest.
    ApplyManifest,
    /// The platform reset onto a nightly build.
    Reset,
}

impl fmt::Display for BringupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateCluster => f.write_str("cluster creation"),
            Self::VerifyReachability => f.write_str("cluster reachability check"),
            Self::ApplyManifest => f.write_str("manifest apply"),
            Self::Reset => f.write_str("platform reset"),
        }
    }
}

/// Which image set a sync batch covered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SyncStage {
    /// Platform and dependency images.
    Core,
    /// Images of an optional component.
    Component(ComponentProfile),
    /// Nightly platform images ahead of a reset.
    Nightly,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core => f.write_str("core"),
            Self::Component(profile) => write!(f, "{profile} component"),
            Self::Nightly => f.write_str("nightly"),
        }
    }
}

/// Outcome of one sync batch within the pipeline.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StageReport {
    /// Image set the batch covered.
    pub stage: SyncStage,
    /// Per-image results.
    pub report: BatchReport,
}

/// Summary of a bring-up that ran to completion.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BringupReport {
    /// Where the kind configuration was written.
    pub config_path: Utf8PathBuf,
    /// Every sync batch, in execution order.
    pub stages: Vec<StageReport>,
    /// Nightly build the platform was reset onto, if any.
    pub reset: Option<NightlyTag>,
    /// Follow-up commands worth running by hand.
    pub hints: Vec<String>,
}

impl BringupReport {
    /// Images that failed to sync in any batch, tagged with their stage.
    #[must_use]
    pub fn failed_artifacts(&self) -> Vec<(SyncStage, ArtifactRef)> {
        self.stages
            .iter()
            .flat_map(|stage| {
                stage
                    .report
                    .failed_artifacts()
                    .into_iter()
                    .map(move |artifact| (stage.stage, artifact))
            })
            .collect()
    }

    /// Returns `true` when every image synced.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.stages.iter().all(|stage| stage.report.is_success())
    }
}

/// Fatal bring-up failures.
#[derive(Debug, Error)]
pub enum BringupError {
    /// Raised when the request is missing a required value.
    #[error("invalid bring-up request: {field} must not be empty")]
    InvalidRequest {
        /// Field that failed validation.
        field: String,
    },
    /// Raised when a requested component has no image profile.
    #[error(transparent)]
    Component(#[from] ArtifactError),
    /// Raised when the kind configuration cannot be written.
    #[error("failed to render cluster configuration: {0}")]
    Render(#[from] KindConfigError),
    /// Raised when a sequential step fails.
    #[error("{step} failed: {source}")]
    Step {
        /// Step that failed.
        step: BringupStep,
        /// Underlying command failure.
        #[source]
        source: CommandError,
    },
    /// Raised when a sync batch had failures and the policy is to abort.
    #[error("{stage} image sync failed for {}", join_artifacts(.artifacts))]
    ArtifactSync {
        /// Image set of the failed batch.
        stage: SyncStage,
        /// Images that failed to sync.
        artifacts: Vec<ArtifactRef>,
    },
}

fn join_artifacts(artifacts: &[ArtifactRef]) -> String {
    artifacts
        .iter()
        .map(ArtifactRef::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
