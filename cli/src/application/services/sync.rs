//! Application service: project tree transfer.

use std::path::Path;

use anyhow::Result;

use crate::application::ports::{FileSync, ProgressReporter, RemoteShell, TimedOut};
use crate::application::services::remote::{HostSession, failure_detail};
use crate::domain::DeployError;

/// Mirror `local_root` into `release_path` on the session's host.
///
/// # Errors
///
/// Returns `DeployError::Sync` when the transfer tool fails or cannot be
/// started, and `DeployError::Timeout` when it hangs.
pub async fn sync_release(
    syncer: &impl FileSync,
    session: &HostSession<'_, impl RemoteShell, impl ProgressReporter>,
    local_root: &Path,
    release_path: &str,
) -> Result<()> {
    let host = session.label().to_string();
    tracing::debug!(host = %host, local = %local_root.display(), remote = release_path, "sync");
    let output = match syncer
        .sync(session.credential(), local_root, release_path)
        .await
    {
        Ok(output) => output,
        Err(e) => {
            if let Some(t) = e.downcast_ref::<TimedOut>() {
                return Err(DeployError::Timeout {
                    host,
                    command: format!("sync {}", local_root.display()),
                    secs: t.timeout.as_secs(),
                }
                .into());
            }
            return Err(DeployError::Sync {
                host,
                detail: format!("{e:#}"),
            }
            .into());
        }
    };
    if !output.status.success() {
        return Err(DeployError::Sync {
            host,
            detail: failure_detail(
                output.status.code(),
                &String::from_utf8_lossy(&output.stderr),
            ),
        }
        .into());
    }
    Ok(())
}
