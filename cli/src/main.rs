//! rollout: release-based deployments over ssh

use clap::Parser;
use rollout_cli::cli::Cli;
use rollout_cli::domain::DeployError;
use rollout_cli::output::json::{AlreadyRendered, format_error};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let json = cli.wants_json();
    if let Err(e) = cli.run().await {
        if json && e.downcast_ref::<AlreadyRendered>().is_some() {
            tracing::debug!(error = %e, "failure already rendered as JSON");
        } else if json {
            let code = e
                .downcast_ref::<DeployError>()
                .map_or("ERROR", DeployError::code);
            match format_error(&format!("{e:#}"), code) {
                Ok(text) => println!("{text}"),
                Err(_) => eprintln!("Error: {e:#}"),
            }
        } else {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(1);
    }
}
