//! Application service: hand services to the process supervisor (pm2).

use anyhow::{Context, Result};

use crate::application::ports::{ProgressReporter, RemoteShell};
use crate::application::services::remote::HostSession;
use crate::domain::service::DESCRIPTOR_DIR;
use crate::domain::{RemoteCommand, SupervisorDescriptor};

/// Upload `descriptor` and start or reload its service.
///
/// `pm2 startOrReload` replaces a running app of the same name in place,
/// so applying twice leaves one app.
///
/// # Errors
///
/// Returns `DeployError::RemoteExecution` if the upload or the supervisor
/// command fails.
pub async fn apply(
    session: &HostSession<'_, impl RemoteShell, impl ProgressReporter>,
    descriptor: &SupervisorDescriptor,
) -> Result<()> {
    let json = descriptor
        .to_ecosystem_json()
        .with_context(|| format!("serializing descriptor for {}", descriptor.name))?;
    let path = descriptor.remote_path();
    let dir = format!("{}/{DESCRIPTOR_DIR}", descriptor.cwd);
    session
        .run(&RemoteCommand::exec("mkdir", ["-p", dir.as_str()]))
        .await?;
    session.upload(&path, json.as_bytes()).await?;
    session
        .run(
            &RemoteCommand::exec("pm2", ["startOrReload", path.as_str(), "--update-env"])
                .in_dir(&descriptor.cwd),
        )
        .await?;
    tracing::info!(host = session.label(), service = %descriptor.name, "service applied");
    Ok(())
}

/// Apply every descriptor in order, then persist the supervisor's process list.
///
/// # Errors
///
/// Stops at the first failing service.
pub async fn apply_all(
    session: &HostSession<'_, impl RemoteShell, impl ProgressReporter>,
    descriptors: &[SupervisorDescriptor],
) -> Result<()> {
    if descriptors.is_empty() {
        session.warn("no services configured for this host");
        return Ok(());
    }
    for descriptor in descriptors {
        session.step(&format!("starting {}", descriptor.name));
        apply(session, descriptor).await?;
    }
    session.run(&RemoteCommand::exec("pm2", ["save"])).await?;
    Ok(())
}
