//! Application service: release directory management on one host.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::Result;
use rollout_common::ReleaseLayout;

use crate::application::ports::{ProgressReporter, RemoteShell};
use crate::application::services::remote::HostSession;
use crate::domain::RemoteCommand;
use crate::domain::release::{release_id_from_target, select_prunable};

/// Create `path` (and its parents) on the host. Idempotent.
///
/// # Errors
///
/// Returns `DeployError::RemoteExecution` if `mkdir` fails.
pub async fn create_release_directory(
    session: &HostSession<'_, impl RemoteShell, impl ProgressReporter>,
    path: &str,
) -> Result<()> {
    session
        .run(&RemoteCommand::exec("mkdir", ["-p", path]))
        .await?;
    Ok(())
}

/// Temporary link name used while swapping `current`.
#[must_use]
pub fn staging_link(current: &str, release_id: &str) -> String {
    format!("{current}.tmp-{release_id}")
}

/// Point `current` at `release_path`.
///
/// The new link is created under a temporary name and renamed over
/// `current`, so readers see either the old or the new release, never a
/// missing link.
///
/// # Errors
///
/// Returns `DeployError::RemoteExecution` if either command fails.
pub async fn cutover(
    session: &HostSession<'_, impl RemoteShell, impl ProgressReporter>,
    release_id: &str,
    release_path: &str,
    current: &str,
) -> Result<()> {
    let staging = staging_link(current, release_id);
    session
        .run(&RemoteCommand::exec("ln", ["-sfn", release_path, staging.as_str()]))
        .await?;
    session
        .run(&RemoteCommand::exec("mv", ["-T", staging.as_str(), current]))
        .await?;
    tracing::info!(host = session.label(), release = release_id, "current switched");
    Ok(())
}

/// Release the `current` link resolves to, if any.
///
/// A missing link (first deploy) is not an error.
///
/// # Errors
///
/// Returns an error only if the host cannot be reached.
pub async fn current_release(
    session: &HostSession<'_, impl RemoteShell, impl ProgressReporter>,
    layout: &ReleaseLayout,
) -> Result<Option<String>> {
    let out = session
        .probe(&RemoteCommand::exec("readlink", [layout.current.as_str()]))
        .await?;
    Ok(out
        .as_deref()
        .and_then(release_id_from_target)
        .map(str::to_owned))
}

/// Names under `releases/`, as listed by the host. Empty before the first deploy.
///
/// # Errors
///
/// Returns an error only if the host cannot be reached.
pub async fn list_releases(
    session: &HostSession<'_, impl RemoteShell, impl ProgressReporter>,
    layout: &ReleaseLayout,
) -> Result<Vec<String>> {
    let out = session
        .probe(&RemoteCommand::exec("ls", ["-1", layout.releases_dir.as_str()]))
        .await?
        .unwrap_or_default();
    Ok(out
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect())
}

/// Delete all but the newest `keep` releases, never the one `current` uses.
///
/// Returns the deleted release ids, oldest first.
///
/// # Errors
///
/// Returns `DeployError::RemoteExecution` if listing or deletion fails.
pub async fn prune_releases(
    session: &HostSession<'_, impl RemoteShell, impl ProgressReporter>,
    layout: &ReleaseLayout,
    keep: usize,
) -> Result<Vec<String>> {
    let entries = list_releases(session, layout).await?;
    let current = current_release(session, layout).await?;
    let doomed = select_prunable(&entries, current.as_deref(), keep);
    if doomed.is_empty() {
        return Ok(doomed);
    }
    let mut args = vec!["-rf".to_string()];
    args.extend(doomed.iter().map(|id| layout.release_path(id)));
    session.run(&RemoteCommand::exec("rm", args)).await?;
    tracing::info!(host = session.label(), pruned = doomed.len(), "old releases removed");
    Ok(doomed)
}

/// Link each shared path from `shared/` into the release.
///
/// Whatever the sync put at the link location is replaced, so the shared
/// copy always wins.
///
/// # Errors
///
/// Returns `DeployError::RemoteExecution` if a command fails.
pub async fn link_shared_paths(
    session: &HostSession<'_, impl RemoteShell, impl ProgressReporter>,
    layout: &ReleaseLayout,
    release_path: &str,
    shared_paths: &[String],
) -> Result<()> {
    for rel in shared_paths {
        let rel = rel.trim_matches('/');
        let source = format!("{}/{rel}", layout.shared_dir);
        let link = format!("{release_path}/{rel}");
        let link_parent = parent_dir(&link);
        session
            .run(&RemoteCommand::exec(
                "mkdir",
                ["-p", parent_dir(&source), link_parent],
            ))
            .await?;
        session
            .run(&RemoteCommand::exec("rm", ["-rf", link.as_str()]))
            .await?;
        session
            .run(&RemoteCommand::exec("ln", ["-s", source.as_str(), link.as_str()]))
            .await?;
    }
    Ok(())
}

fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}
