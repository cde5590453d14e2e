//! Tool configuration loading via `ortho-config`.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::artifact::SyncFailurePolicy;

/// Default path of the rendered kind cluster configuration.
pub const DEFAULT_KIND_CONFIG_PATH: &str = "config.yaml";

/// Default repository of the kind node image.
pub const DEFAULT_NODE_IMAGE_REPOSITORY: &str = "kindest/node";

/// External tool locations and bring-up policy, merged from defaults,
/// configuration files, and environment variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "KSUP",
    discovery(
        app_name = "ksup",
        env_var = "KSUP_CONFIG_PATH",
        config_file_name = "ksup.toml",
        dotfile_name = ".ksup.toml",
        project_file_name = "ksup.toml"
    )
)]
pub struct ToolConfig {
    /// Path to the container engine used to pull images.
    #[ortho_config(default = "docker".to_owned())]
    pub docker_bin: String,
    /// Path to the `kind` executable.
    #[ortho_config(default = "kind".to_owned())]
    pub kind_bin: String,
    /// Path to the `kubectl` executable.
    #[ortho_config(default = "kubectl".to_owned())]
    pub kubectl_bin: String,
    /// Where the rendered kind cluster configuration is written.
    #[ortho_config(default = DEFAULT_KIND_CONFIG_PATH.to_owned())]
    pub kind_config_path: String,
    /// Repository of the kind node image; the Kubernetes version is used as
    /// its tag.
    #[ortho_config(default = DEFAULT_NODE_IMAGE_REPOSITORY.to_owned())]
    pub node_image_repository: String,
    /// Whether a failed image sync aborts the bring-up instead of being
    /// reported at the end.
    #[ortho_config(default = false)]
    pub abort_on_sync_failure: bool,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl ToolConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to ksup.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("ksup")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Returns the policy applied when an image sync batch has failures.
    #[must_use]
    pub const fn sync_failure_policy(&self) -> SyncFailurePolicy {
        if self.abort_on_sync_failure {
            SyncFailurePolicy::Abort
        } else {
            SyncFailurePolicy::Continue
        }
    }

    /// Performs semantic validation on required fields. Error messages include
    /// guidance on how to provide missing values via environment variables or
    /// configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            (
                &self.docker_bin,
                FieldMetadata::new("container engine binary", "KSUP_DOCKER_BIN", "docker_bin"),
            ),
            (
                &self.kind_bin,
                FieldMetadata::new("kind binary", "KSUP_KIND_BIN", "kind_bin"),
            ),
            (
                &self.kubectl_bin,
                FieldMetadata::new("kubectl binary", "KSUP_KUBECTL_BIN", "kubectl_bin"),
            ),
            (
                &self.kind_config_path,
                FieldMetadata::new(
                    "kind configuration path",
                    "KSUP_KIND_CONFIG_PATH",
                    "kind_config_path",
                ),
            ),
            (
                &self.node_image_repository,
                FieldMetadata::new(
                    "node image repository",
                    "KSUP_NODE_IMAGE_REPOSITORY",
                    "node_image_repository",
                ),
            ),
        ];

        for (value, metadata) in &fields {
            Self::require_field(value, metadata)?;
        }
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
