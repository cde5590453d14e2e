//! Concurrent fan-out of sync jobs with a join barrier.
//!
//! Every job in a batch gets one blocking worker, bounded only by the
//! runtime's blocking pool. [`ParallelSyncBatch::run`] returns only after
//! every job has reported back, and the report holds one result per job in
//! submission order.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, warn};

use super::ArtifactRef;
use super::job::{ArtifactSyncer, SyncJobError};

/// Result of one job within a batch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JobOutcome {
    /// Image the job synchronised.
    pub artifact: ArtifactRef,
    /// Whether the job succeeded.
    pub result: Result<(), SyncJobError>,
}

impl JobOutcome {
    /// Returns `true` when the job succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-job results of a finished batch, in submission order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BatchReport {
    outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    /// All job outcomes.
    #[must_use]
    pub fn outcomes(&self) -> &[JobOutcome] {
        &self.outcomes
    }

    /// Outcomes of the jobs that failed.
    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_success())
    }

    /// Images whose job failed.
    #[must_use]
    pub fn failed_artifacts(&self) -> Vec<ArtifactRef> {
        self.failures()
            .map(|outcome| outcome.artifact.clone())
            .collect()
    }

    /// Returns `true` when every job succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(JobOutcome::is_success)
    }

    /// Number of jobs in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns `true` for a batch with no jobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl FromIterator<JobOutcome> for BatchReport {
    fn from_iter<T: IntoIterator<Item = JobOutcome>>(iter: T) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

/// Runs sync jobs concurrently through a shared [`ArtifactSyncer`].
#[derive(Debug)]
pub struct ParallelSyncBatch<S> {
    syncer: Arc<S>,
}

impl<S> Clone for ParallelSyncBatch<S> {
    fn clone(&self) -> Self {
        Self {
            syncer: Arc::clone(&self.syncer),
        }
    }
}

impl<S: ArtifactSyncer> ParallelSyncBatch<S> {
    /// Creates a batch runner around `syncer`.
    #[must_use]
    pub fn new(syncer: S) -> Self {
        Self {
            syncer: Arc::new(syncer),
        }
    }

    /// Returns the shared syncer.
    #[must_use]
    pub fn syncer(&self) -> &S {
        &self.syncer
    }

    /// Starts one job per artifact and waits for all of them.
    ///
    /// Individual failures never cut the batch short; they are recorded in
    /// the returned report for the caller to judge.
    pub async fn run(&self, artifacts: &[ArtifactRef]) -> BatchReport {
        let mut slots: Vec<Option<Result<(), SyncJobError>>> = vec![None; artifacts.len()];
        let mut jobs = JoinSet::new();

        for (index, artifact) in artifacts.iter().cloned().enumerate() {
            let syncer = Arc::clone(&self.syncer);
            jobs.spawn_blocking(move || {
                let result = catch_unwind(AssertUnwindSafe(|| syncer.sync(&artifact)))
                    .unwrap_or_else(|_| {
                        Err(SyncJobError::Incomplete {
                            artifact,
                            message: String::from("sync job panicked"),
                        })
                    });
                (index, result)
            });
        }

        while let Some(joined) = jobs.join_next().await {
            match joined {
                Ok((index, result)) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(result);
                    }
                }
                Err(err) => warn!(error = %err, "sync worker was lost"),
            }
        }

        let report = artifacts
            .iter()
            .cloned()
            .zip(slots)
            .map(|(artifact, slot)| {
                let result = slot.unwrap_or_else(|| {
                    Err(SyncJobError::Incomplete {
                        artifact: artifact.clone(),
                        message: String::from("sync worker did not report a result"),
                    })
                });
                JobOutcome { artifact, result }
            })
            .collect::<BatchReport>();

        for failure in report.failures() {
            if let Err(err) = &failure.result {
                warn!(artifact = %failure.artifact, error = %err, "image sync failed");
            }
        }
        info!(
            total = report.len(),
            failed = report.failures().count(),
            "image sync batch finished"
        );
        report
    }
}
