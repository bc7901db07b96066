//! Single-host deployment state machine.
//!
//! Pure types only. The state order is fixed; the application layer walks
//! [`DeployStep::ALL`] and stops at the first failing step.

use std::fmt;

use serde::Serialize;

/// One state of a host's deployment pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeployStep {
    AllocateRelease,
    CreateDirectory,
    Sync,
    SetupRuntime,
    InstallDeps,
    Build,
    BeforeHooks,
    Cutover,
    StartServices,
    AfterHooks,
    PruneOldReleases,
}

impl DeployStep {
    /// Every step, in the order a host runs them.
    pub const ALL: [DeployStep; 11] = [
        Self::AllocateRelease,
        Self::CreateDirectory,
        Self::Sync,
        Self::SetupRuntime,
        Self::InstallDeps,
        Self::Build,
        Self::BeforeHooks,
        Self::Cutover,
        Self::StartServices,
        Self::AfterHooks,
        Self::PruneOldReleases,
    ];

    /// Human-readable progress label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::AllocateRelease => "allocating release",
            Self::CreateDirectory => "creating release directory",
            Self::Sync => "syncing project files",
            Self::SetupRuntime => "setting up runtime",
            Self::InstallDeps => "installing dependencies",
            Self::Build => "building",
            Self::BeforeHooks => "running before hooks",
            Self::Cutover => "switching current release",
            Self::StartServices => "starting services",
            Self::AfterHooks => "running after hooks",
            Self::PruneOldReleases => "pruning old releases",
        }
    }
}

impl fmt::Display for DeployStep {
    /// Same spelling as the `--json` report.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AllocateRelease => "allocate-release",
            Self::CreateDirectory => "create-directory",
            Self::Sync => "sync",
            Self::SetupRuntime => "setup-runtime",
            Self::InstallDeps => "install-deps",
            Self::Build => "build",
            Self::BeforeHooks => "before-hooks",
            Self::Cutover => "cutover",
            Self::StartServices => "start-services",
            Self::AfterHooks => "after-hooks",
            Self::PruneOldReleases => "prune-old-releases",
        };
        f.write_str(name)
    }
}

/// Terminal state of one host's pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum HostState {
    Done,
    Failed { step: DeployStep, error: String },
}

/// What happened on one host.
#[derive(Debug, Clone, Serialize)]
pub struct HostReport {
    pub host: String,
    /// Release allocated for this run, if allocation got that far.
    pub release: Option<String>,
    /// Steps that completed, in order.
    pub completed: Vec<DeployStep>,
    #[serde(flatten)]
    pub state: HostState,
}

impl HostReport {
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == HostState::Done
    }

    /// True when the "current" symlink was moved to this run's release.
    #[must_use]
    pub fn cut_over(&self) -> bool {
        self.completed.contains(&DeployStep::Cutover)
    }
}

/// Aggregated result for an environment or cluster.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub target: String,
    /// True when `target` names a cluster rather than a single environment.
    pub cluster: bool,
    pub hosts: Vec<HostReport>,
}

impl DeployReport {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.hosts.iter().all(HostReport::is_done)
    }

    /// Hosts whose pipeline ended in `Failed`, in config order.
    #[must_use]
    pub fn failed_hosts(&self) -> Vec<String> {
        self.hosts
            .iter()
            .filter(|h| !h.is_done())
            .map(|h| h.host.clone())
            .collect()
    }
}
