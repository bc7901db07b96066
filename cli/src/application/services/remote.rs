//! Application service: remote command execution for one host.
//!
//! `HostSession` binds a `RemoteShell`, a credential and a progress reporter
//! so the step services can say `session.run(&cmd)` and get stdout back, with
//! failures already typed as `DeployError`.

use anyhow::Result;
use rollout_common::RemoteCredential;

use crate::application::ports::{ProgressReporter, RemoteShell, TimedOut};
use crate::domain::{DeployError, RemoteCommand};

/// One host's view of the remote side.
pub struct HostSession<'a, S, R> {
    shell: &'a S,
    reporter: &'a R,
    credential: &'a RemoteCredential,
    label: &'a str,
}

impl<'a, S: RemoteShell, R: ProgressReporter> HostSession<'a, S, R> {
    pub fn new(
        shell: &'a S,
        reporter: &'a R,
        credential: &'a RemoteCredential,
        label: &'a str,
    ) -> Self {
        Self {
            shell,
            reporter,
            credential,
            label,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        self.label
    }

    #[must_use]
    pub fn credential(&self) -> &RemoteCredential {
        self.credential
    }

    /// Progress line prefixed with the host label.
    pub fn step(&self, message: &str) {
        self.reporter.step(&format!("[{}] {message}", self.label));
    }

    pub fn success(&self, message: &str) {
        self.reporter.success(&format!("[{}] {message}", self.label));
    }

    pub fn warn(&self, message: &str) {
        self.reporter.warn(&format!("[{}] {message}", self.label));
    }

    /// Run `command` and return its stdout.
    ///
    /// Stderr from a successful command is surfaced as a warning, not an
    /// error: package managers and version managers write progress there.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::RemoteExecution` when the host is unreachable or
    /// the command exits non-zero, and `DeployError::Timeout` when it hangs.
    pub async fn run(&self, command: &RemoteCommand) -> Result<String> {
        tracing::debug!(host = self.label, command = %command, "remote exec");
        let output = self
            .shell
            .exec(self.credential, command)
            .await
            .map_err(|e| self.transport_error(&command.summary(), &e))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(DeployError::RemoteExecution {
                host: self.label.to_string(),
                command: command.summary(),
                detail: failure_detail(output.status.code(), &stderr),
            }
            .into());
        }
        self.surface_stderr(&stderr);
        Ok(stdout)
    }

    /// Run a query whose non-zero exit means "absent" rather than failure.
    ///
    /// Returns `None` on non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns an error only when the host cannot be reached or the command
    /// times out.
    pub async fn probe(&self, command: &RemoteCommand) -> Result<Option<String>> {
        tracing::debug!(host = self.label, command = %command, "remote probe");
        let output = self
            .shell
            .exec(self.credential, command)
            .await
            .map_err(|e| self.transport_error(&command.summary(), &e))?;
        Ok(output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).into_owned()))
    }

    /// Write `contents` to `remote_path` on the host.
    ///
    /// # Errors
    ///
    /// Same as [`HostSession::run`].
    pub async fn upload(&self, remote_path: &str, contents: &[u8]) -> Result<()> {
        tracing::debug!(host = self.label, path = remote_path, bytes = contents.len(), "upload");
        let summary = format!("upload {remote_path}");
        let output = self
            .shell
            .upload(self.credential, remote_path, contents)
            .await
            .map_err(|e| self.transport_error(&summary, &e))?;
        if !output.status.success() {
            return Err(DeployError::RemoteExecution {
                host: self.label.to_string(),
                command: summary,
                detail: failure_detail(
                    output.status.code(),
                    &String::from_utf8_lossy(&output.stderr),
                ),
            }
            .into());
        }
        Ok(())
    }

    fn surface_stderr(&self, stderr: &str) {
        let noise = stderr.trim();
        if noise.is_empty() {
            return;
        }
        tracing::warn!(host = self.label, stderr = noise, "remote stderr");
        for line in noise.lines().filter(|l| !l.trim().is_empty()).take(5) {
            self.warn(line.trim());
        }
    }

    fn transport_error(&self, command: &str, err: &anyhow::Error) -> anyhow::Error {
        if let Some(timeout) = err.downcast_ref::<TimedOut>() {
            return DeployError::Timeout {
                host: self.label.to_string(),
                command: command.to_string(),
                secs: timeout.timeout.as_secs(),
            }
            .into();
        }
        DeployError::RemoteExecution {
            host: self.label.to_string(),
            command: command.to_string(),
            detail: format!("{err:#}"),
        }
        .into()
    }
}

/// Describe a non-zero exit for an error message.
#[must_use]
pub fn failure_detail(code: Option<i32>, stderr: &str) -> String {
    let status = code.map_or_else(|| "killed by signal".to_string(), |c| format!("exit status {c}"));
    match stderr.trim() {
        "" => status,
        text => format!("{status}: {text}"),
    }
}
