//! Binary entry point for the `ksup` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use ksup::{
    BringupError, BringupOrchestrator, BringupReport, BringupRequest, ComponentToggler,
    ConfigError, EnableAction, ImageSyncer, KindConfigError, PortMappings, SonarQubeEndpoint,
    StreamingCommandRunner, ToggleError, ToggleTarget, ToolConfig,
};

mod cli;

use cli::{Cli, EnableCommand, KindCommand};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid port mapping: {0}")]
    PortMapping(#[from] KindConfigError),
    #[error("bring-up failed: {0}")]
    Bringup(#[from] BringupError),
    #[error("{0}")]
    Toggle(#[from] ToggleError),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    match cli {
        Cli::Kind(args) => run_kind(&args).await,
        Cli::Enable(args) => run_enable(&args),
    }
}

fn load_tools() -> Result<ToolConfig, CliError> {
    let tools = ToolConfig::load_without_cli_args()?;
    tools.validate()?;
    Ok(tools)
}

fn build_request(args: &KindCommand) -> Result<BringupRequest, CliError> {
    Ok(BringupRequest {
        cluster_name: args.name.clone(),
        kubernetes_version: args.version.clone(),
        port_mappings: PortMappings::parse_all(&args.port_mappings)?,
        platform_version: args.ks_version.clone(),
        components: BringupRequest::parse_components(&args.components)?,
        reset: args.reset,
        nightly: args.nightly.clone(),
    })
}

async fn run_kind(args: &KindCommand) -> Result<(), CliError> {
    let request = build_request(args)?;
    let tools = load_tools()?;

    let runner = StreamingCommandRunner::new();
    let syncer = ImageSyncer::new(runner.clone(), &tools, &request.cluster_name);
    let orchestrator = BringupOrchestrator::new(runner, syncer, tools);
    let report = orchestrator.execute(&request).await?;

    write_report(io::stdout(), io::stderr(), &report);
    Ok(())
}

fn build_action(args: &EnableCommand) -> Result<EnableAction, CliError> {
    if args.edit {
        return Ok(EnableAction::Edit);
    }
    let target = args
        .component
        .as_deref()
        .unwrap_or_default()
        .parse::<ToggleTarget>()?;
    let action = match target {
        ToggleTarget::Component(component) => EnableAction::Switch {
            component,
            enabled: !args.toggle,
        },
        ToggleTarget::SonarQube => EnableAction::SonarQube(SonarQubeEndpoint::new(
            args.sonarqube.as_deref().unwrap_or_default(),
            args.sonarqube_token.as_deref().unwrap_or_default(),
        )?),
    };
    Ok(action)
}

fn run_enable(args: &EnableCommand) -> Result<(), CliError> {
    let action = build_action(args)?;
    let tools = load_tools()?;

    let toggler = ComponentToggler::new(StreamingCommandRunner::new(), &tools.kubectl_bin);
    toggler.apply(&action)?;
    Ok(())
}

fn write_report(mut out: impl Write, mut err: impl Write, report: &BringupReport) {
    for hint in &report.hints {
        writeln!(out, "{hint}").ok();
    }
    if let Some(tag) = report.reset {
        writeln!(out, "platform reset onto {tag}").ok();
    }

    let failed = report.failed_artifacts();
    if failed.is_empty() {
        return;
    }
    writeln!(err, "{} image(s) failed to sync:", failed.len()).ok();
    for (stage, artifact) in failed {
        writeln!(err, "  {artifact} ({stage})").ok();
    }
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
