//! Container image artifacts and their concurrent synchronisation into a
//! kind cluster.
//!
//! An artifact is synchronised by a [`job`]: fetch it with the container
//! engine, then stage it into the cluster. A [`batch`] runs many jobs at once
//! and reports the outcome of every one of them.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub mod batch;
pub mod job;

pub use batch::{BatchReport, JobOutcome, ParallelSyncBatch};
pub use job::{ArtifactSyncer, ImageSyncer, SyncJobError};

use crate::nightly::NightlyTag;

/// Platform and dependency images every bring-up needs.
pub const CORE_IMAGES: &[&str] = &[
    "kubesphere/ks-installer:v3.0.0",
    "kubesphere/ks-apiserver:v3.0.0",
    "kubesphere/ks-controller-manager:v3.0.0",
    "kubesphere/ks-console:v3.0.0",
    "redis:5.0.5-alpine",
    "osixia/openldap:1.3.0",
    "minio/minio:RELEASE.2019-08-07T01-59-21Z",
    "mysql:8.0.11",
];

/// Images needed by the DevOps component.
pub const DEVOPS_IMAGES: &[&str] = &[
    "kubesphere/jenkins-uc:v3.0.0",
    "jenkins/jenkins:2.176.2",
    "jenkins/jnlp-slave:3.27-1",
    "kubesphere/builder-base:v2.1.0",
    "kubesphere/builder-nodejs:v2.1.0",
    "kubesphere/builder-go:v2.1.0",
    "kubesphere/builder-maven:v2.1.0",
];

/// Repositories published as nightly builds, tagged `nightly-YYYYMMDD`.
pub const NIGHTLY_REPOSITORIES: &[&str] = &[
    "kubespheredev/ks-installer",
    "kubespheredev/ks-apiserver",
    "kubespheredev/ks-controller-manager",
    "kubespheredev/ks-console",
];

/// A fully qualified image reference such as `org/name:tag`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    /// Creates a reference, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Empty`] when the reference is blank, or
    /// [`ArtifactError::Whitespace`] when it contains inner whitespace.
    pub fn new(reference: impl Into<String>) -> Result<Self, ArtifactError> {
        let raw = reference.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ArtifactError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(ArtifactError::Whitespace {
                reference: trimmed.to_owned(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    fn known(reference: &str) -> Self {
        Self(reference.to_owned())
    }

    /// Returns the reference as passed to the container tools.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ArtifactRef {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Errors raised when building artifact references or profiles.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ArtifactError {
    /// Raised for a blank reference.
    #[error("artifact reference must not be empty")]
    Empty,
    /// Raised for a reference containing whitespace.
    #[error("artifact reference must not contain whitespace: {reference:?}")]
    Whitespace {
        /// The offending reference.
        reference: String,
    },
    /// Raised for a component name with no image profile.
    #[error("unknown component {name:?}; supported components: devops")]
    UnknownComponent {
        /// Name that was requested.
        name: String,
    },
}

/// Optional component whose images can be preloaded during bring-up.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ComponentProfile {
    /// Jenkins and the builder images used by DevOps pipelines.
    DevOps,
}

impl ComponentProfile {
    /// Name used on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DevOps => "devops",
        }
    }

    /// Images the component needs.
    #[must_use]
    pub fn artifacts(self) -> Vec<ArtifactRef> {
        match self {
            Self::DevOps => DEVOPS_IMAGES.iter().copied().map(ArtifactRef::known).collect(),
        }
    }
}

impl fmt::Display for ComponentProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ComponentProfile {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "devops" => Ok(Self::DevOps),
            other => Err(ArtifactError::UnknownComponent {
                name: other.to_owned(),
            }),
        }
    }
}

/// Images every bring-up synchronises before applying manifests.
#[must_use]
pub fn core_artifacts() -> Vec<ArtifactRef> {
    CORE_IMAGES.iter().copied().map(ArtifactRef::known).collect()
}

/// Nightly builds of the platform images for `tag`.
#[must_use]
pub fn nightly_artifacts(tag: &NightlyTag) -> Vec<ArtifactRef> {
    NIGHTLY_REPOSITORIES
        .iter()
        .map(|repository| ArtifactRef(format!("{repository}:{}", tag.tag())))
        .collect()
}

/// What to do when a sync batch finishes with failed jobs.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SyncFailurePolicy {
    /// Report the failures and carry on with the next step.
    #[default]
    Continue,
    /// Stop before the next step.
    Abort,
}
