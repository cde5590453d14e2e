//! Command-line interface definitions for the `ksup` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `ksup` binary.
#[derive(Debug, Parser)]
#[command(
    name = "ksup",
    about = "Bring up a local KubeSphere cluster on kind and manage its components",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Create a kind cluster and install the platform into it.
    #[command(name = "kind", about = "Create a kind cluster and install the platform into it")]
    Kind(KindCommand),
    /// Enable or disable a platform component.
    #[command(name = "enable", about = "Enable or disable a platform component")]
    Enable(EnableCommand),
}

/// Arguments for the `ksup kind` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct KindCommand {
    /// Name of the kind cluster.
    #[arg(short = 'n', long, default_value = "kind", value_name = "NAME")]
    pub(crate) name: String,
    /// Kubernetes version, used as the kind node image tag.
    #[arg(short = 'v', long, default_value = "v1.18.2", value_name = "VERSION")]
    pub(crate) version: String,
    /// Ports to expose on the host, as containerPort=hostPort.
    ///
    /// Accepts a comma-separated list or repeated flags.
    #[arg(long, value_name = "MAPPING", value_delimiter = ',')]
    pub(crate) port_mappings: Vec<String>,
    /// Platform release whose installer manifests are applied.
    #[arg(long, default_value = "v3.0.0", value_name = "VERSION")]
    pub(crate) ks_version: String,
    /// Optional components whose images are preloaded (supported: devops).
    #[arg(long, value_name = "COMPONENT", value_delimiter = ',')]
    pub(crate) components: Vec<String>,
    /// Reset the platform onto a nightly build after installing it.
    #[arg(long)]
    pub(crate) reset: bool,
    /// Nightly build to reset onto: `latest`, YYYY-MM-DD, or YYYYMMDD.
    #[arg(long, value_name = "TOKEN")]
    pub(crate) nightly: Option<String>,
}

/// Arguments for the `ksup enable` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct EnableCommand {
    /// Component to switch, such as devops, logging, or servicemesh.
    ///
    /// Use `sonarqube` together with --sonarqube and --sonarqube-token to
    /// point the console at a SonarQube server.
    #[arg(value_name = "COMPONENT", required_unless_present = "edit")]
    pub(crate) component: Option<String>,
    /// Disable the component instead of enabling it.
    #[arg(short = 't', long)]
    pub(crate) toggle: bool,
    /// Edit the cluster configuration instead. Other options are ignored.
    #[arg(short = 'e', long)]
    pub(crate) edit: bool,
    /// The SonarQube URL.
    #[arg(long, alias = "sonar", value_name = "URL")]
    pub(crate) sonarqube: Option<String>,
    /// The token of SonarQube.
    #[arg(long, value_name = "TOKEN")]
    pub(crate) sonarqube_token: Option<String>,
}
