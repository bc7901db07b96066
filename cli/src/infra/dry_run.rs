//! `RemoteShell` and `FileSync` that record instead of executing.
//!
//! Used by `rollout deploy run --dry-run`. Every call succeeds with empty
//! output, so the pipeline walks all of its steps and the log shows the exact
//! remote commands a real run would issue, in order, per host.

use std::path::Path;
use std::process::Output;
use std::sync::Mutex;

use anyhow::Result;
use rollout_common::RemoteCredential;

use crate::application::ports::{FileSync, RemoteShell};
use crate::domain::RemoteCommand;
use crate::domain::target::host_label;

/// One recorded remote action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCommand {
    pub host: String,
    pub command: String,
}

#[derive(Default)]
pub struct DryRunShell {
    log: Mutex<Vec<PlannedCommand>>,
}

impl DryRunShell {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in call order.
    #[must_use]
    pub fn into_plan(self) -> Vec<PlannedCommand> {
        self.log
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn record(&self, credential: &RemoteCredential, command: String) -> Output {
        self.log
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(PlannedCommand {
                host: host_label(credential),
                command,
            });
        success()
    }
}

#[cfg(unix)]
fn success() -> Output {
    use std::os::unix::process::ExitStatusExt;
    Output {
        status: std::process::ExitStatus::from_raw(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

#[cfg(windows)]
fn success() -> Output {
    use std::os::windows::process::ExitStatusExt;
    Output {
        status: std::process::ExitStatus::from_raw(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

impl RemoteShell for DryRunShell {
    async fn exec(
        &self,
        credential: &RemoteCredential,
        command: &RemoteCommand,
    ) -> Result<Output> {
        Ok(self.record(credential, command.render()))
    }

    async fn upload(
        &self,
        credential: &RemoteCredential,
        remote_path: &str,
        contents: &[u8],
    ) -> Result<Output> {
        Ok(self.record(
            credential,
            format!("upload {remote_path} ({} bytes)", contents.len()),
        ))
    }
}

impl FileSync for DryRunShell {
    async fn sync(
        &self,
        credential: &RemoteCredential,
        local_root: &Path,
        remote_path: &str,
    ) -> Result<Output> {
        Ok(self.record(
            credential,
            format!("rsync {}/ -> {remote_path}/", local_root.display()),
        ))
    }
}
