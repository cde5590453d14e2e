//! Local cluster bring-up.
//!
//! [`BringupOrchestrator::execute`] renders the kind configuration, creates
//! the cluster, checks it answers, preloads images, applies the platform
//! installer manifests, and optionally resets the platform onto a nightly
//! build. Sequential steps stop the run on the first failure. Image sync
//! batches never do unless the configured [`SyncFailurePolicy`] says so.

use camino::Utf8PathBuf;
use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use crate::artifact::{
    ArtifactRef, ArtifactSyncer, ParallelSyncBatch, SyncFailurePolicy, core_artifacts,
    nightly_artifacts,
};
use crate::command::{CommandRunner, CommandSpec};
use crate::config::ToolConfig;
use crate::kind_config;
use crate::nightly::{self, NightlyTag};

mod types;

pub use types::{
    BringupError, BringupReport, BringupRequest, BringupStep, DEFAULT_CLUSTER_NAME,
    DEFAULT_KUBERNETES_VERSION, DEFAULT_PLATFORM_VERSION, StageReport, SyncStage,
};

const INSTALLER_RELEASE_URL: &str = "https://github.com/kubesphere/ks-installer/releases/download";
const INSTALLER_MANIFESTS: [&str; 2] = ["kubesphere-installer.yaml", "cluster-configuration.yaml"];

/// Patch that stops the installer from re-pulling preloaded images.
pub const IMAGE_PULL_POLICY_HINT: &str = concat!(
    "kubectl -n kubesphere-system patch deploy ks-installer --type=json ",
    r#"-p='[{"op":"replace","#,
    r#""path":"/spec/template/spec/containers/0/imagePullPolicy","#,
    r#""value":"IfNotPresent"}]'"#,
);

/// Installer manifest URLs for a platform release, in apply order.
#[must_use]
pub fn manifest_urls(platform_version: &str) -> [String; 2] {
    INSTALLER_MANIFESTS
        .map(|manifest| format!("{INSTALLER_RELEASE_URL}/{platform_version}/{manifest}"))
}

/// Drives a bring-up through a command runner and an image syncer.
#[derive(Debug)]
pub struct BringupOrchestrator<R: CommandRunner, S: ArtifactSyncer> {
    runner: R,
    batch: ParallelSyncBatch<S>,
    tools: ToolConfig,
    policy: SyncFailurePolicy,
    today: NaiveDate,
}

impl<R, S> BringupOrchestrator<R, S>
where
    R: CommandRunner,
    S: ArtifactSyncer,
{
    /// Creates an orchestrator that resolves nightly tokens against the
    /// local date.
    #[must_use]
    pub fn new(runner: R, syncer: S, tools: ToolConfig) -> Self {
        let policy = tools.sync_failure_policy();
        Self {
            runner,
            batch: ParallelSyncBatch::new(syncer),
            tools,
            policy,
            today: Local::now().date_naive(),
        }
    }

    /// Overrides the date `latest` nightly tokens are resolved against.
    #[must_use]
    pub const fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Runs the bring-up described by `request`.
    ///
    /// # Errors
    ///
    /// Returns [`BringupError`] when the request is invalid, the kind
    /// configuration cannot be written, a sequential step fails, or an image
    /// batch fails under [`SyncFailurePolicy::Abort`].
    pub async fn execute(&self, request: &BringupRequest) -> Result<BringupReport, BringupError> {
        request.validate()?;

        let config_path = Utf8PathBuf::from(&self.tools.kind_config_path);
        kind_config::write(&config_path, &request.port_mappings)?;
        info!(
            path = %config_path,
            mappings = request.port_mappings.len(),
            "wrote kind configuration"
        );

        let mut report = BringupReport {
            config_path,
            stages: Vec::new(),
            reset: None,
            hints: Vec::new(),
        };

        self.step(BringupStep::CreateCluster, &self.create_command(request))?;
        self.step(
            BringupStep::VerifyReachability,
            &self.reachability_command(&request.cluster_name),
        )?;

        self.sync(SyncStage::Core, &core_artifacts(), &mut report)
            .await?;

        for url in manifest_urls(&request.platform_version) {
            self.step(BringupStep::ApplyManifest, &self.apply_command(&url))?;
        }
        report.hints.push(IMAGE_PULL_POLICY_HINT.to_owned());

        for component in &request.components {
            self.sync(
                SyncStage::Component(*component),
                &component.artifacts(),
                &mut report,
            )
            .await?;
        }

        if request.reset {
            report.reset = self.reset(request, &mut report).await?;
        }

        info!(
            cluster = %request.cluster_name,
            failed_images = report.failed_artifacts().len(),
            "bring-up finished"
        );
        Ok(report)
    }

    async fn reset(
        &self,
        request: &BringupRequest,
        report: &mut BringupReport,
    ) -> Result<Option<NightlyTag>, BringupError> {
        let token = request.nightly.as_deref().unwrap_or_default();
        let Some(tag) = nightly::resolve(token, self.today) else {
            warn!(token, "no nightly build matches the token; skipping reset");
            return Ok(None);
        };

        self.sync(SyncStage::Nightly, &nightly_artifacts(&tag), report)
            .await?;
        self.step(BringupStep::Reset, &self.reset_command(&tag))?;
        Ok(Some(tag))
    }

    async fn sync(
        &self,
        stage: SyncStage,
        artifacts: &[ArtifactRef],
        report: &mut BringupReport,
    ) -> Result<(), BringupError> {
        info!(%stage, images = artifacts.len(), "syncing images");
        let batch = self.batch.run(artifacts).await;
        let failed = batch.failed_artifacts();
        report.stages.push(StageReport {
            stage,
            report: batch,
        });

        if failed.is_empty() {
            return Ok(());
        }
        match self.policy {
            SyncFailurePolicy::Abort => Err(BringupError::ArtifactSync {
                stage,
                artifacts: failed,
            }),
            SyncFailurePolicy::Continue => {
                warn!(%stage, failed = failed.len(), "continuing despite image sync failures");
                Ok(())
            }
        }
    }

    fn step(&self, step: BringupStep, command: &CommandSpec) -> Result<(), BringupError> {
        info!(%step, command = %command, "running step");
        self.runner
            .run_checked(command)
            .map_err(|source| BringupError::Step { step, source })
    }

    fn create_command(&self, request: &BringupRequest) -> CommandSpec {
        CommandSpec::new(&self.tools.kind_bin)
            .args(["create", "cluster", "--image"])
            .arg(format!(
                "{}:{}",
                self.tools.node_image_repository, request.kubernetes_version
            ))
            .arg("--config")
            .arg(&self.tools.kind_config_path)
            .arg("--name")
            .arg(&request.cluster_name)
    }

    fn reachability_command(&self, cluster_name: &str) -> CommandSpec {
        CommandSpec::new(&self.tools.kubectl_bin)
            .arg("cluster-info")
            .arg("--context")
            .arg(format!("kind-{cluster_name}"))
    }

    fn apply_command(&self, url: &str) -> CommandSpec {
        CommandSpec::new(&self.tools.kubectl_bin)
            .args(["apply", "-f"])
            .arg(url)
    }

    fn reset_command(&self, tag: &NightlyTag) -> CommandSpec {
        CommandSpec::new(&self.tools.kubectl_bin)
            .args(["ks", "com", "reset", "--nightly"])
            .arg(tag.compact_date())
            .arg("-a")
    }
}
