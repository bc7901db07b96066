//! Application service: the deployment use-case.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.
//!
//! A run resolves the target and plans every host before touching the
//! network. Hosts then run their pipelines concurrently on the current task;
//! within a host, [`DeployStep::ALL`] is walked strictly in order and the first
//! error ends that host's run. A failed host never cancels the others.

use std::path::Path;

use anyhow::{Result, anyhow};
use chrono::Utc;
use futures_util::future::join_all;
use rollout_common::{Defaults, DeploymentConfig, ReleaseLayout};

use crate::application::ports::{FileSync, ProgressReporter, RemoteShell};
use crate::application::services::remote::HostSession;
use crate::application::services::{hooks, release, runtime_setup, service_manager, sync};
use crate::domain::{
    DeployError, DeployReport, DeployStep, HostPlan, HostReport, HostState, ReleaseIdAllocator,
    plan_hosts, render_descriptor, resolve_target, validate_config,
};

pub struct DeployOptions<'a, R: ProgressReporter> {
    pub reporter: &'a R,
    /// Project tree mirrored into each release.
    pub local_root: &'a Path,
}

/// Deploy `name` (an environment or a cluster) and report per-host outcomes.
///
/// The returned report may contain failed hosts; use [`check_report`] to
/// turn it into an error.
///
/// # Errors
///
/// Returns `DeployError::Configuration` for an unknown name or an invalid
/// configuration. No remote command has run when this happens.
pub async fn deploy(
    shell: &impl RemoteShell,
    syncer: &impl FileSync,
    config: &DeploymentConfig,
    name: &str,
    opts: DeployOptions<'_, impl ProgressReporter>,
) -> Result<DeployReport> {
    let target = resolve_target(config, name).map_err(DeployError::from)?;
    validate_config(config).map_err(DeployError::from)?;
    let plans = plan_hosts(&target).map_err(DeployError::from)?;
    tracing::info!(target_name = name, hosts = plans.len(), "deployment planned");

    let allocator = ReleaseIdAllocator::new();
    let runs = plans.iter().map(|plan| {
        let pipeline = HostPipeline {
            session: HostSession::new(shell, opts.reporter, &plan.profile.credential, &plan.label),
            syncer,
            defaults: &config.defaults,
            plan,
            layout: plan.profile.target.layout(),
            local_root: opts.local_root,
            allocator: &allocator,
            release_id: None,
        };
        pipeline.run()
    });
    let hosts = join_all(runs).await;

    Ok(DeployReport {
        target: name.to_string(),
        cluster: target.is_cluster(),
        hosts,
    })
}

/// Convert a report with failures into the matching error.
///
/// # Errors
///
/// `DeployError::ClusterFailed` listing every failed host for a cluster, or
/// `DeployError::HostFailed` for a single environment.
pub fn check_report(report: &DeployReport) -> Result<()> {
    if report.succeeded() {
        return Ok(());
    }
    if report.cluster {
        return Err(DeployError::ClusterFailed {
            cluster: report.target.clone(),
            failed_hosts: report.failed_hosts(),
        }
        .into());
    }
    let Some((host, step, error)) = report.hosts.iter().find_map(|h| match &h.state {
        HostState::Failed { step, error } => Some((&h.host, *step, error)),
        HostState::Done => None,
    }) else {
        return Ok(());
    };
    Err(DeployError::HostFailed {
        host: host.clone(),
        step,
        source: anyhow!("{error}"),
    }
    .into())
}

struct HostPipeline<'a, S, R, F> {
    session: HostSession<'a, S, R>,
    syncer: &'a F,
    defaults: &'a Defaults,
    plan: &'a HostPlan,
    layout: ReleaseLayout,
    local_root: &'a Path,
    allocator: &'a ReleaseIdAllocator,
    release_id: Option<String>,
}

impl<S: RemoteShell, R: ProgressReporter, F: FileSync> HostPipeline<'_, S, R, F> {
    async fn run(mut self) -> HostReport {
        let mut completed = Vec::with_capacity(DeployStep::ALL.len());
        for step in DeployStep::ALL {
            self.session.step(step.label());
            tracing::info!(host = self.session.label(), %step, "step started");
            if let Err(e) = self.run_step(step).await {
                let error = format!("{e:#}");
                tracing::warn!(host = self.session.label(), %step, error = %error, "step failed");
                self.session.warn(&format!("failed at {step}"));
                return HostReport {
                    host: self.plan.label.clone(),
                    release: self.release_id,
                    completed,
                    state: HostState::Failed { step, error },
                };
            }
            completed.push(step);
        }
        let release = self.release_id.unwrap_or_default();
        self.session.success(&format!("release {release} is live"));
        HostReport {
            host: self.plan.label.clone(),
            release: Some(release),
            completed,
            state: HostState::Done,
        }
    }

    fn release_path(&self) -> Result<String> {
        self.release_id
            .as_deref()
            .map(|id| self.layout.release_path(id))
            .ok_or_else(|| anyhow!("release id not allocated"))
    }

    async fn run_step(&mut self, step: DeployStep) -> Result<()> {
        let runtime = self.defaults.runtime_version.as_str();
        let target = &self.plan.profile.target;
        match step {
            DeployStep::AllocateRelease => {
                self.release_id = Some(self.allocator.allocate(Utc::now()));
                Ok(())
            }
            DeployStep::CreateDirectory => {
                release::create_release_directory(&self.session, &self.release_path()?).await
            }
            DeployStep::Sync => {
                let path = self.release_path()?;
                sync::sync_release(self.syncer, &self.session, self.local_root, &path).await?;
                release::link_shared_paths(&self.session, &self.layout, &path, &target.shared_paths)
                    .await
            }
            DeployStep::SetupRuntime => {
                runtime_setup::setup_runtime(&self.session, runtime, &self.release_path()?).await
            }
            DeployStep::InstallDeps => {
                runtime_setup::install_dependencies(
                    &self.session,
                    runtime,
                    &self.defaults.install_command,
                    &self.release_path()?,
                )
                .await
            }
            DeployStep::Build => {
                runtime_setup::build(
                    &self.session,
                    runtime,
                    &self.defaults.build_command,
                    &self.release_path()?,
                )
                .await
            }
            DeployStep::BeforeHooks => {
                hooks::run_hooks(&self.session, runtime, &self.release_path()?, &target.hooks.before)
                    .await
            }
            DeployStep::Cutover => {
                let id = self
                    .release_id
                    .as_deref()
                    .ok_or_else(|| anyhow!("release id not allocated"))?;
                release::cutover(
                    &self.session,
                    id,
                    &self.layout.release_path(id),
                    &self.layout.current,
                )
                .await
            }
            DeployStep::StartServices => {
                let path = self.release_path()?;
                let descriptors: Vec<_> = target
                    .services
                    .iter()
                    .map(|svc| render_descriptor(svc, &self.defaults.supervisor, &path))
                    .collect();
                service_manager::apply_all(&self.session, &descriptors).await
            }
            DeployStep::AfterHooks => {
                hooks::run_hooks(&self.session, runtime, &self.layout.current, &target.hooks.after)
                    .await
            }
            DeployStep::PruneOldReleases => {
                let pruned =
                    release::prune_releases(&self.session, &self.layout, self.defaults.keep_releases)
                        .await?;
                if !pruned.is_empty() {
                    self.session
                        .step(&format!("removed {} old release(s)", pruned.len()));
                }
                Ok(())
            }
        }
    }
}
