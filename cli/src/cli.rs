//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Release-based deployments over ssh
#[derive(Parser)]
#[command(
    name = "rollout",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Path to the deployment config (default: ./rollout.yaml)
    #[arg(long, global = true, value_name = "PATH", env = "ROLLOUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Configure and run deployments
    #[command(subcommand)]
    Deploy(commands::deploy::DeployCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Default `tracing` filter for the chosen verbosity, used when `RUST_LOG` is unset.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "warn,rollout_cli=debug,rollout_common=debug",
            _ => "trace",
        }
    }

    /// Whether `--json` was given.
    #[must_use]
    pub fn wants_json(&self) -> bool {
        self.json
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            no_color,
            quiet,
            json,
            config,
            command,
            ..
        } = self;
        let app = AppContext::new(AppFlags {
            no_color,
            quiet,
            json,
            config,
        });
        match command {
            Command::Deploy(cmd) => commands::deploy::run(&app, cmd).await,
            Command::Version => commands::version::run(&app),
        }
    }
}
