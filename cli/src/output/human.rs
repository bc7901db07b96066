//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;
use rollout_common::DeploymentConfig;

use crate::application::services::releases::HostReleases;
use crate::domain::{DeployReport, HostReport, HostState};
use crate::infra::dry_run::PlannedCommand;
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        self.ctx.info(&format!("rollout v{version}"));
    }

    /// Render the per-host outcome of a deployment.
    ///
    /// Silent under `--quiet`; a failed run still reports through the error
    /// the command returns.
    pub fn render_report(&self, report: &DeployReport) {
        let kind = if report.cluster { "cluster" } else { "environment" };
        self.ctx.blank();
        self.ctx
            .header(&format!("Deployment to {kind} '{}'", report.target));
        for host in &report.hosts {
            self.ctx.line(&format!("    {}", self.host_line(host)));
        }
        self.ctx.blank();
        if report.succeeded() {
            self.ctx.success(&format!(
                "{} '{}' deployed to {} host(s)",
                kind,
                report.target,
                report.hosts.len()
            ));
        }
    }

    fn host_line(&self, host: &HostReport) -> String {
        let release = host.release.as_deref().unwrap_or("-");
        match &host.state {
            HostState::Done => format!(
                "{} {:<24} {release}  live",
                "✓".style(self.ctx.styles.success),
                host.host
            ),
            HostState::Failed { step, error } => {
                let note = if host.cut_over() {
                    " (current already switched)"
                } else {
                    ""
                };
                format!(
                    "{} {:<24} {release}  failed at {step}{note}\n        {}",
                    "✗".style(self.ctx.styles.error),
                    host.host,
                    first_line(error).style(self.ctx.styles.dim)
                )
            }
        }
    }

    /// Render configured environments and clusters.
    pub fn render_targets(&self, config: &DeploymentConfig) {
        self.ctx.header("Environments:");
        if config.environments.is_empty() {
            self.ctx.line("    (none)");
        }
        for (name, env) in &config.environments {
            self.ctx.line(&format!(
                "    {name:<16} {}@{}  {}",
                env.credential.username,
                env.credential.host,
                env.target.deploy_path.style(self.ctx.styles.dim)
            ));
        }
        self.ctx.blank();
        self.ctx.header("Clusters:");
        if config.clusters.is_empty() {
            self.ctx.line("    (none)");
        }
        for (name, cluster) in &config.clusters {
            self.ctx.line(&format!(
                "    {name:<16} {} host(s)  {}",
                cluster.servers.len(),
                cluster.target.deploy_path.style(self.ctx.styles.dim)
            ));
        }
    }

    /// Render the releases found on each host, marking the live one.
    pub fn render_releases(&self, hosts: &[HostReleases]) {
        for host in hosts {
            self.ctx.header(&host.host);
            if let Some(error) = &host.error {
                self.ctx.error(&format!("{}: {}", host.host, first_line(error)));
                continue;
            }
            if host.releases.is_empty() {
                self.ctx.line("    (no releases)");
            }
            for id in &host.releases {
                if host.current.as_deref() == Some(id.as_str()) {
                    self.ctx.line(&format!(
                        "    {} {}",
                        id.style(self.ctx.styles.bold),
                        "(current)".style(self.ctx.styles.success)
                    ));
                } else {
                    self.ctx.line(&format!("    {id}"));
                }
            }
            self.ctx.blank();
        }
    }

    /// Render the commands a dry run would have issued.
    pub fn render_plan(&self, plan: &[PlannedCommand]) {
        for entry in plan {
            self.ctx.line(&format!(
                "{} $ {}",
                self.ctx.host_tag(&entry.host),
                entry.command
            ));
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text)
}
