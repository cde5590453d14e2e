//! A single fetch-then-stage image synchronisation.

use thiserror::Error;
use tracing::debug;

use super::ArtifactRef;
use crate::command::{CommandError, CommandRunner, CommandSpec};
use crate::config::ToolConfig;

/// Errors raised by one sync job.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SyncJobError {
    /// Raised when pulling the image fails; staging is not attempted.
    #[error("failed to fetch {artifact}: {source}")]
    Fetch {
        /// Image being synchronised.
        artifact: ArtifactRef,
        /// Underlying command failure.
        #[source]
        source: CommandError,
    },
    /// Raised when loading the pulled image into the cluster fails.
    #[error("failed to stage {artifact}: {source}")]
    Stage {
        /// Image being synchronised.
        artifact: ArtifactRef,
        /// Underlying command failure.
        #[source]
        source: CommandError,
    },
    /// Raised when the job ended without reporting a result.
    #[error("sync job for {artifact} did not complete: {message}")]
    Incomplete {
        /// Image being synchronised.
        artifact: ArtifactRef,
        /// Human-readable description of what happened.
        message: String,
    },
}

impl SyncJobError {
    /// Image the failed job was synchronising.
    #[must_use]
    pub const fn artifact(&self) -> &ArtifactRef {
        match self {
            Self::Fetch { artifact, .. }
            | Self::Stage { artifact, .. }
            | Self::Incomplete { artifact, .. } => artifact,
        }
    }
}

/// Synchronises one artifact into the target cluster.
///
/// Implementations are shared across the worker threads of a batch.
pub trait ArtifactSyncer: Send + Sync + 'static {
    /// Fetches `artifact`, then stages it. Staging never starts before the
    /// fetch has completed successfully, and nothing is retried or rolled
    /// back.
    ///
    /// # Errors
    ///
    /// Returns [`SyncJobError`] naming the step that failed.
    fn sync(&self, artifact: &ArtifactRef) -> Result<(), SyncJobError>;
}

/// Pulls images with the container engine and loads them with `kind`.
#[derive(Clone, Debug)]
pub struct ImageSyncer<R> {
    runner: R,
    docker_bin: String,
    kind_bin: String,
    cluster_name: String,
}

impl<R: CommandRunner> ImageSyncer<R> {
    /// Creates a syncer targeting the kind cluster `cluster_name`.
    #[must_use]
    pub fn new(runner: R, tools: &ToolConfig, cluster_name: impl Into<String>) -> Self {
        Self {
            runner,
            docker_bin: tools.docker_bin.clone(),
            kind_bin: tools.kind_bin.clone(),
            cluster_name: cluster_name.into(),
        }
    }

    /// Command that pulls `artifact` into the local image store.
    #[must_use]
    pub fn fetch_command(&self, artifact: &ArtifactRef) -> CommandSpec {
        CommandSpec::new(&self.docker_bin).args(["pull", artifact.as_str()])
    }

    /// Command that loads `artifact` into the cluster nodes.
    #[must_use]
    pub fn stage_command(&self, artifact: &ArtifactRef) -> CommandSpec {
        CommandSpec::new(&self.kind_bin).args([
            "load",
            "docker-image",
            artifact.as_str(),
            "--name",
            self.cluster_name.as_str(),
        ])
    }
}

impl<R> ArtifactSyncer for ImageSyncer<R>
where
    R: CommandRunner + Send + Sync + 'static,
{
    fn sync(&self, artifact: &ArtifactRef) -> Result<(), SyncJobError> {
        self.runner
            .run_checked(&self.fetch_command(artifact))
            .map_err(|source| SyncJobError::Fetch {
                artifact: artifact.clone(),
                source,
            })?;
        debug!(%artifact, "fetched");

        self.runner
            .run_checked(&self.stage_command(artifact))
            .map_err(|source| SyncJobError::Stage {
                artifact: artifact.clone(),
                source,
            })?;
        debug!(%artifact, cluster = %self.cluster_name, "staged");
        Ok(())
    }
}
