//! Core library for the `ksup` local cluster tool.
//!
//! The crate brings a KubeSphere platform up on a local kind cluster: it
//! renders the cluster configuration, drives the external `kind`, `docker`
//! and `kubectl` tools through a [`CommandRunner`] that relays their output
//! as it arrives, preloads container images with concurrent sync batches,
//! and toggles platform components once the cluster is running.

pub mod artifact;
pub mod bringup;
pub mod command;
pub mod component;
pub mod config;
pub mod kind_config;
pub mod nightly;
pub mod test_support;

pub use artifact::{
    ArtifactError, ArtifactRef, ArtifactSyncer, BatchReport, ComponentProfile, ImageSyncer,
    JobOutcome, ParallelSyncBatch, SyncFailurePolicy, SyncJobError,
};
pub use bringup::{
    BringupError, BringupOrchestrator, BringupReport, BringupRequest, BringupStep, StageReport,
    SyncStage,
};
pub use command::{
    CommandError, CommandOutcome, CommandRunner, CommandSpec, StreamingCommandRunner,
};
pub use component::{
    ComponentToggler, EnableAction, PlatformComponent, SonarQubeEndpoint, ToggleError, ToggleTarget,
};
pub use config::{ConfigError, ToolConfig};
pub use kind_config::{KindConfigError, PortMapping, PortMappings};
pub use nightly::NightlyTag;
