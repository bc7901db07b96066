//! Application service: inspect the releases present on each host.

use anyhow::Result;
use futures_util::future::join_all;
use rollout_common::DeploymentConfig;
use serde::Serialize;

use crate::application::ports::{ProgressReporter, RemoteShell};
use crate::application::services::release::{current_release, list_releases};
use crate::application::services::remote::HostSession;
use crate::domain::release::is_release_id;
use crate::domain::{DeployError, HostPlan, plan_hosts, resolve_target};

/// Releases found on one host, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct HostReleases {
    pub host: String,
    pub releases: Vec<String>,
    pub current: Option<String>,
    /// Set when the host could not be inspected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// List releases on every host of `name`.
///
/// Unreachable hosts are reported in their entry rather than failing the
/// whole listing.
///
/// # Errors
///
/// Returns `DeployError::Configuration` for an unknown name.
pub async fn list_target_releases(
    shell: &impl RemoteShell,
    reporter: &impl ProgressReporter,
    config: &DeploymentConfig,
    name: &str,
) -> Result<Vec<HostReleases>> {
    let target = resolve_target(config, name).map_err(DeployError::from)?;
    let plans = plan_hosts(&target).map_err(DeployError::from)?;
    Ok(join_all(plans.iter().map(|plan| inspect_host(shell, reporter, plan))).await)
}

async fn inspect_host(
    shell: &impl RemoteShell,
    reporter: &impl ProgressReporter,
    plan: &HostPlan,
) -> HostReleases {
    let session = HostSession::new(shell, reporter, &plan.profile.credential, &plan.label);
    let layout = plan.profile.target.layout();
    let listing = async {
        let mut releases: Vec<String> = list_releases(&session, &layout)
            .await?
            .into_iter()
            .filter(|name| is_release_id(name))
            .collect();
        releases.sort_unstable_by(|a, b| b.cmp(a));
        let current = current_release(&session, &layout).await?;
        anyhow::Ok((releases, current))
    };
    match listing.await {
        Ok((releases, current)) => HostReleases {
            host: plan.label.clone(),
            releases,
            current,
            error: None,
        },
        Err(e) => HostReleases {
            host: plan.label.clone(),
            releases: Vec::new(),
            current: None,
            error: Some(format!("{e:#}")),
        },
    }
}
