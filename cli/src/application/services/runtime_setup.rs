//! Application service: runtime, dependency and build steps inside a release.
//!
//! Each step is one composite remote script chained with `&&`, so a failure
//! mid-chain aborts the rest and surfaces as a single `DeployError::Setup`.

use anyhow::Result;

use crate::application::ports::{ProgressReporter, RemoteShell};
use crate::application::services::remote::HostSession;
use crate::domain::runtime::{install_runtime_script, with_runtime};
use crate::domain::{DeployError, DeployStep, RemoteCommand};

/// Install (or re-select) the runtime version on the host.
///
/// # Errors
///
/// Returns `DeployError::Setup` for a failing version-manager command, and
/// passes `DeployError::Timeout` through unchanged.
pub async fn setup_runtime(
    session: &HostSession<'_, impl RemoteShell, impl ProgressReporter>,
    runtime_version: &str,
    release_path: &str,
) -> Result<()> {
    let cmd = RemoteCommand::script(install_runtime_script(runtime_version)).in_dir(release_path);
    run_setup_step(session, DeployStep::SetupRuntime, &cmd).await
}

/// Run the install command with the runtime active.
///
/// # Errors
///
/// Same as [`setup_runtime`].
pub async fn install_dependencies(
    session: &HostSession<'_, impl RemoteShell, impl ProgressReporter>,
    runtime_version: &str,
    install_command: &str,
    release_path: &str,
) -> Result<()> {
    let cmd =
        RemoteCommand::script(with_runtime(runtime_version, install_command)).in_dir(release_path);
    run_setup_step(session, DeployStep::InstallDeps, &cmd).await
}

/// Run the build command with the runtime active.
///
/// # Errors
///
/// Same as [`setup_runtime`].
pub async fn build(
    session: &HostSession<'_, impl RemoteShell, impl ProgressReporter>,
    runtime_version: &str,
    build_command: &str,
    release_path: &str,
) -> Result<()> {
    let cmd =
        RemoteCommand::script(with_runtime(runtime_version, build_command)).in_dir(release_path);
    run_setup_step(session, DeployStep::Build, &cmd).await
}

async fn run_setup_step(
    session: &HostSession<'_, impl RemoteShell, impl ProgressReporter>,
    step: DeployStep,
    cmd: &RemoteCommand,
) -> Result<()> {
    match session.run(cmd).await {
        Ok(_) => Ok(()),
        Err(e) => match e.downcast::<DeployError>() {
            Ok(DeployError::RemoteExecution { host, detail, .. }) => {
                Err(DeployError::Setup { host, step, detail }.into())
            }
            Ok(other) => Err(other.into()),
            Err(e) => Err(e),
        },
    }
}
