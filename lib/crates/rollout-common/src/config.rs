use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::EnvMap;

/// Number of releases retained per host when `keepReleases` is not set.
pub const DEFAULT_KEEP_RELEASES: usize = 5;

/// Upper bound for a single remote command when `commandTimeoutSecs` is not set.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 900;

/// SSH port used when a credential omits `port`.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Top-level deployment configuration (`rollout.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    pub defaults: Defaults,
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentProfile>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub clusters: BTreeMap<String, ClusterProfile>,
}

/// Settings shared by every environment and cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Defaults {
    /// Runtime version handed to the version manager, e.g. `"20"` or `"lts/iron"`.
    pub runtime_version: String,
    #[serde(default = "default_install_command")]
    pub install_command: String,
    #[serde(default = "default_build_command")]
    pub build_command: String,
    #[serde(default = "default_keep_releases")]
    pub keep_releases: usize,
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    #[serde(default)]
    pub supervisor: SupervisorDefaults,
}

fn default_install_command() -> String {
    "npm ci".to_string()
}

fn default_build_command() -> String {
    "npm run build".to_string()
}

fn default_keep_releases() -> usize {
    DEFAULT_KEEP_RELEASES
}

fn default_command_timeout_secs() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

/// Process-supervisor policy applied to every service unless overridden.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorDefaults {
    #[serde(default = "default_instances")]
    pub instances: u32,
    #[serde(default = "default_max_memory_restart")]
    pub max_memory_restart: String,
    #[serde(default)]
    pub env: EnvMap,
}

fn default_instances() -> u32 {
    1
}

fn default_max_memory_restart() -> String {
    "512M".to_string()
}

impl Default for SupervisorDefaults {
    fn default() -> Self {
        Self {
            instances: default_instances(),
            max_memory_restart: default_max_memory_restart(),
            env: EnvMap::new(),
        }
    }
}

/// How to reach one host.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCredential {
    pub host: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Authentication method resolved from a [`RemoteCredential`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth<'a> {
    /// Path to a private key file (may start with `~`).
    Key(&'a str),
    Password(&'a str),
}

impl RemoteCredential {
    /// Effective SSH port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_SSH_PORT)
    }

    /// `user@host`, the ssh destination.
    #[must_use]
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }

    /// Returns the auth method, or `None` unless exactly one of key/password is set.
    #[must_use]
    pub fn auth(&self) -> Option<Auth<'_>> {
        match (self.private_key.as_deref(), self.password.as_deref()) {
            (Some(key), None) => Some(Auth::Key(key)),
            (None, Some(pass)) => Some(Auth::Password(pass)),
            _ => None,
        }
    }
}

impl fmt::Debug for RemoteCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCredential")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("private_key", &self.private_key)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("port", &self.port)
            .finish()
    }
}

/// Operator-supplied shell commands run around the main sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hooks {
    #[serde(default)]
    pub before: Vec<String>,
    #[serde(default)]
    pub after: Vec<String>,
}

impl Hooks {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

/// One deployable process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    pub name: String,
    /// Entry script, relative to the release root.
    pub script: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<u32>,
    #[serde(default, skip_serializing_if = "EnvMap::is_empty")]
    pub env: EnvMap,
}

/// What gets deployed and where, shared by environments and clusters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TargetSpec {
    /// Absolute root of the release layout on the remote host.
    pub deploy_path: String,
    /// Paths under `shared/` linked into every release.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_paths: Vec<String>,
    #[serde(default)]
    pub services: Vec<ServiceSpec>,
    #[serde(default, skip_serializing_if = "Hooks::is_empty")]
    pub hooks: Hooks,
}

impl TargetSpec {
    #[must_use]
    pub fn layout(&self) -> ReleaseLayout {
        ReleaseLayout::from_root(&self.deploy_path)
    }
}

/// A named single-host deployment target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentProfile {
    #[serde(flatten)]
    pub credential: RemoteCredential,
    #[serde(flatten)]
    pub target: TargetSpec,
}

/// One member of a cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterServer {
    #[serde(flatten)]
    pub credential: RemoteCredential,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// A named set of hosts sharing one deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProfile {
    #[serde(flatten)]
    pub target: TargetSpec,
    pub servers: Vec<ClusterServer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services_by_role: Option<BTreeMap<String, Vec<String>>>,
}

/// Filesystem convention on the remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseLayout {
    pub deploy_root: String,
    pub current: String,
    pub releases_dir: String,
    pub shared_dir: String,
}

impl ReleaseLayout {
    /// Derives `current`, `releases/` and `shared/` from the deploy root.
    #[must_use]
    pub fn from_root(root: &str) -> Self {
        let root = match root.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        let join = |leaf: &str| {
            if root == "/" {
                format!("/{leaf}")
            } else {
                format!("{root}/{leaf}")
            }
        };
        Self {
            deploy_root: root.to_string(),
            current: join("current"),
            releases_dir: join("releases"),
            shared_dir: join("shared"),
        }
    }

    /// Absolute path of the release with the given id.
    #[must_use]
    pub fn release_path(&self, release_id: &str) -> String {
        format!("{}/{release_id}", self.releases_dir)
    }
}
