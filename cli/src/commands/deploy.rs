//! `rollout deploy`: init, run, list and releases.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Subcommand};
use rollout_common::DeploymentConfig;

use crate::app::AppContext;
use crate::application::ports::{ConfigStore, FileSync, RemoteShell};
use crate::application::services::config_service::{self, InitOutcome};
use crate::application::services::deploy::{DeployOptions, check_report, deploy};
use crate::application::services::releases::list_target_releases;
use crate::domain::DeployReport;
use crate::domain::target::target_names;
use crate::infra::dry_run::DryRunShell;
use crate::output::human::HumanRenderer;
use crate::output::json;
use crate::output::reporter::{SilentReporter, TerminalReporter};

#[derive(Subcommand)]
pub enum DeployCommand {
    /// Write a template rollout.yaml if none exists
    Init,

    /// Deploy to an environment or a cluster
    Run(RunArgs),

    /// List configured environments and clusters
    List,

    /// Show the releases present on each host
    Releases {
        /// Environment or cluster name
        name: String,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Environment or cluster name
    pub name: String,

    /// Print the remote commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Per-command timeout in seconds (overrides commandTimeoutSecs)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

/// Dispatch a `deploy` subcommand.
///
/// # Errors
///
/// Returns an error if the subcommand fails; the caller maps it to exit code 1.
pub async fn run(app: &AppContext, cmd: DeployCommand) -> Result<()> {
    match cmd {
        DeployCommand::Init => init(app),
        DeployCommand::Run(args) => run_deploy(app, &args).await,
        DeployCommand::List => list(app),
        DeployCommand::Releases { name } => releases(app, &name).await,
    }
}

fn init(app: &AppContext) -> Result<()> {
    let store = app.config_store();
    let path = store.path();
    let outcome = config_service::init_config(&store)?;
    if app.is_json() {
        return json::print(&serde_json::json!({
            "path": path.display().to_string(),
            "created": outcome == InitOutcome::Created,
        }));
    }
    match outcome {
        InitOutcome::Created => app
            .output
            .success(&format!("Created {}", path.display())),
        InitOutcome::AlreadyExists => app.output.info(&format!(
            "{} already exists, leaving it untouched",
            path.display()
        )),
    }
    Ok(())
}

async fn run_deploy(app: &AppContext, args: &RunArgs) -> Result<()> {
    let store = app.config_store();
    let config = config_service::load_config(&store)?;
    let local_root = std::env::current_dir().context("cannot determine working directory")?;

    if args.dry_run {
        return dry_run(app, &config, &args.name, &local_root).await;
    }

    let secs = args
        .timeout
        .unwrap_or(config.defaults.command_timeout_secs);
    let shell = app.ssh_shell(
        Duration::from_secs(secs),
        sync_excludes(&store.path(), &local_root),
    );
    let report = deploy_with(app, &shell, &shell, &config, &args.name, &local_root).await?;

    if app.is_json() {
        json::print(&report)?;
        return check_report(&report).map_err(|e| e.context(json::AlreadyRendered));
    }
    HumanRenderer::new(&app.output).render_report(&report);
    check_report(&report)
}

async fn dry_run(
    app: &AppContext,
    config: &DeploymentConfig,
    name: &str,
    local_root: &Path,
) -> Result<()> {
    let shell = DryRunShell::new();
    deploy_with(app, &shell, &shell, config, name, local_root).await?;
    let plan = shell.into_plan();
    if app.is_json() {
        let entries: Vec<_> = plan
            .iter()
            .map(|p| serde_json::json!({ "host": p.host, "command": p.command }))
            .collect();
        return json::print(&entries);
    }
    HumanRenderer::new(&app.output).render_plan(&plan);
    Ok(())
}

async fn deploy_with(
    app: &AppContext,
    shell: &impl RemoteShell,
    syncer: &impl FileSync,
    config: &DeploymentConfig,
    name: &str,
    local_root: &Path,
) -> Result<DeployReport> {
    let reporter = TerminalReporter::new(&app.output);
    deploy(
        shell,
        syncer,
        config,
        name,
        DeployOptions {
            reporter: &reporter,
            local_root,
        },
    )
    .await
}

/// The config file never leaves the machine, whatever it is called.
fn sync_excludes(config_path: &Path, local_root: &Path) -> Vec<String> {
    let absolute: PathBuf = if config_path.is_absolute() {
        config_path.to_path_buf()
    } else {
        local_root.join(config_path)
    };
    match absolute.strip_prefix(local_root) {
        Ok(rel) => vec![format!("/{}", rel.to_string_lossy())],
        Err(_) => Vec::new(),
    }
}

fn list(app: &AppContext) -> Result<()> {
    let config = config_service::load_config(&app.config_store())?;
    if app.is_json() {
        let (environments, clusters) = target_names(&config);
        return json::print(&serde_json::json!({
            "environments": environments,
            "clusters": clusters,
        }));
    }
    HumanRenderer::new(&app.output).render_targets(&config);
    Ok(())
}

async fn releases(app: &AppContext, name: &str) -> Result<()> {
    let config = config_service::load_config(&app.config_store())?;
    let shell = app.ssh_shell(
        Duration::from_secs(config.defaults.command_timeout_secs),
        Vec::new(),
    );
    let hosts = list_target_releases(&shell, &SilentReporter, &config, name).await?;
    let unreachable = hosts.iter().any(|h| h.error.is_some());
    if app.is_json() {
        json::print(&hosts)?;
        if unreachable {
            return Err(anyhow!("some hosts could not be inspected").context(json::AlreadyRendered));
        }
        return Ok(());
    }
    HumanRenderer::new(&app.output).render_releases(&hosts);
    if unreachable {
        anyhow::bail!("some hosts could not be inspected");
    }
    Ok(())
}
