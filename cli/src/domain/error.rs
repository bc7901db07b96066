//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

use crate::domain::pipeline::DeployStep;

// ── Configuration errors ──────────────────────────────────────────────────────

/// Problems with the deployment configuration. Always raised before any
/// remote side effect.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Unknown environment or cluster '{name}'.\n\n{}", known_targets(.environments, .clusters))]
    UnknownTarget {
        name: String,
        environments: Vec<String>,
        clusters: Vec<String>,
    },

    #[error("Config file not found: {0}. Run 'rollout deploy init' to create one.")]
    NotFound(String),

    #[error("Cannot parse {path}: {detail}")]
    Malformed { path: String, detail: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Cluster '{cluster}' role '{role}' references unknown service '{service}'")]
    UnknownRoleService {
        cluster: String,
        role: String,
        service: String,
    },
}

/// Render the "known names" hint shown with an unknown target.
#[must_use]
pub fn known_targets(environments: &[String], clusters: &[String]) -> String {
    let list = |names: &[String]| {
        if names.is_empty() {
            "(none)".to_string()
        } else {
            names.join(", ")
        }
    };
    format!(
        "Environments: {}\nClusters: {}",
        list(environments),
        list(clusters)
    )
}

// ── Deployment errors ─────────────────────────────────────────────────────────

/// Failures raised while deploying to one or more hosts.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("[{host}] remote command failed: {command}\n{detail}")]
    RemoteExecution {
        host: String,
        command: String,
        detail: String,
    },

    #[error("[{host}] remote command timed out after {secs}s: {command}")]
    Timeout {
        host: String,
        command: String,
        secs: u64,
    },

    #[error("[{host}] file sync failed: {detail}")]
    Sync { host: String, detail: String },

    #[error("[{host}] runtime setup failed during {step}: {detail}")]
    Setup {
        host: String,
        step: DeployStep,
        detail: String,
    },

    #[error("[{host}] hook failed: {command}\n{detail}")]
    Hook {
        host: String,
        command: String,
        detail: String,
    },

    #[error("deployment to {host} failed at {step}")]
    HostFailed {
        host: String,
        step: DeployStep,
        #[source]
        source: anyhow::Error,
    },

    #[error("cluster '{cluster}' deployment failed on: {}", .failed_hosts.join(", "))]
    ClusterFailed {
        cluster: String,
        failed_hosts: Vec<String>,
    },
}

impl DeployError {
    /// Short machine-readable code used by `--json` error output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION",
            Self::RemoteExecution { .. } => "REMOTE_EXECUTION",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Sync { .. } => "SYNC",
            Self::Setup { .. } => "SETUP",
            Self::Hook { .. } => "HOOK",
            Self::HostFailed { .. } => "HOST_FAILED",
            Self::ClusterFailed { .. } => "CLUSTER_FAILED",
        }
    }
}
