//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `rollout_common`: never
//! from `crate::infra`, `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use rollout_common::{DeploymentConfig, RemoteCredential};

use crate::domain::RemoteCommand;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Raised by a [`CommandRunner`] when a process outlives its timeout.
///
/// The process has been killed by the time this is returned.
#[derive(Debug, thiserror::Error)]
#[error("{program} timed out after {}s", .timeout.as_secs())]
pub struct TimedOut {
    pub program: String,
    pub timeout: Duration,
}

/// Abstracts local process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run `program` with extra environment variables and optional stdin,
    /// capturing its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned, and [`TimedOut`] if
    /// it outlives the runner's timeout. On timeout the child must be killed.
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
        stdin: Option<&[u8]>,
    ) -> Result<Output>;
}

// ── Remote Ports ──────────────────────────────────────────────────────────────

/// Runs commands on a remote host over an authenticated channel.
///
/// Implementations return the raw process output; deciding whether a
/// non-zero exit is fatal belongs to the caller.
#[allow(async_fn_in_trait)]
pub trait RemoteShell {
    /// Execute `command` on the host described by `credential`.
    async fn exec(&self, credential: &RemoteCredential, command: &RemoteCommand)
    -> Result<Output>;
    /// Write `contents` to `remote_path`, replacing any existing file.
    async fn upload(
        &self,
        credential: &RemoteCredential,
        remote_path: &str,
        contents: &[u8],
    ) -> Result<Output>;
}

/// Mirrors the local project tree onto a remote directory.
#[allow(async_fn_in_trait)]
pub trait FileSync {
    /// Copy `local_root` into `remote_path`, skipping build and VCS artifacts.
    async fn sync(
        &self,
        credential: &RemoteCredential,
        local_root: &Path,
        remote_path: &str,
    ) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait: no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Configuration Port ────────────────────────────────────────────────────────

/// Abstracts reading and creating the deployment configuration file.
pub trait ConfigStore {
    /// Load and parse the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::NotFound` or `ConfigurationError::Malformed`.
    fn load(&self) -> Result<DeploymentConfig>;
    /// Write `contents` only if no file exists yet. Returns `false` when one does.
    fn create_new(&self, contents: &str) -> Result<bool>;
    /// Location of the configuration file.
    fn path(&self) -> PathBuf;
}
