//! Application service: operator hooks.

use anyhow::Result;

use crate::application::ports::{ProgressReporter, RemoteShell};
use crate::application::services::remote::HostSession;
use crate::domain::runtime::with_runtime;
use crate::domain::{DeployError, RemoteCommand};

/// Run `commands` in order inside `working_path`, with the runtime active.
///
/// The first failure stops the phase. An empty list does nothing.
///
/// # Errors
///
/// Returns `DeployError::Hook` naming the failing command. Timeouts pass
/// through as `DeployError::Timeout`.
pub async fn run_hooks(
    session: &HostSession<'_, impl RemoteShell, impl ProgressReporter>,
    runtime_version: &str,
    working_path: &str,
    commands: &[String],
) -> Result<()> {
    for command in commands {
        session.step(&format!("hook: {command}"));
        let cmd = RemoteCommand::script(with_runtime(runtime_version, command)).in_dir(working_path);
        if let Err(e) = session.run(&cmd).await {
            return Err(match e.downcast::<DeployError>() {
                Ok(DeployError::RemoteExecution { host, detail, .. }) => DeployError::Hook {
                    host,
                    command: command.clone(),
                    detail,
                }
                .into(),
                Ok(other) => other.into(),
                Err(e) => e,
            });
        }
    }
    Ok(())
}
