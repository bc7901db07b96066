//! Supervisor descriptors (pm2 ecosystem files).
//!
//! Pure functions only: rendering a descriptor does no I/O.

use rollout_common::{EnvMap, EnvValue, ServiceSpec, SupervisorDefaults};
use serde::Serialize;

/// Directory inside each release that holds generated descriptors.
pub const DESCRIPTOR_DIR: &str = ".rollout";

/// Everything the supervisor needs to run one service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupervisorDescriptor {
    pub name: String,
    /// Absolute path of the entry script inside the release.
    pub script: String,
    /// Working directory, the release root.
    pub cwd: String,
    pub instances: u32,
    pub max_memory_restart: String,
    pub env: EnvMap,
}

/// Build the descriptor for `service` deployed at `release_path`.
///
/// Environment precedence, lowest first: supervisor defaults, the service
/// `port` as `PORT`, the service's own `env`.
#[must_use]
pub fn render_descriptor(
    service: &ServiceSpec,
    defaults: &SupervisorDefaults,
    release_path: &str,
) -> SupervisorDescriptor {
    let mut env = defaults.env.clone();
    if let Some(port) = service.port {
        env.insert("PORT".to_string(), EnvValue::from(port));
    }
    env.extend(service.env.iter().map(|(k, v)| (k.clone(), v.clone())));

    let release = release_path.trim_end_matches('/');
    let script = service.script.trim_start_matches("./").trim_start_matches('/');

    SupervisorDescriptor {
        name: service.name.clone(),
        script: format!("{release}/{script}"),
        cwd: release.to_string(),
        instances: service.instances.unwrap_or(defaults.instances),
        max_memory_restart: defaults.max_memory_restart.clone(),
        env,
    }
}

#[derive(Serialize)]
struct Ecosystem<'a> {
    apps: [App<'a>; 1],
}

#[derive(Serialize)]
struct App<'a> {
    name: &'a str,
    script: &'a str,
    cwd: &'a str,
    instances: u32,
    exec_mode: &'static str,
    max_memory_restart: &'a str,
    env: &'a EnvMap,
}

impl SupervisorDescriptor {
    /// Serialize to a pm2 ecosystem JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn to_ecosystem_json(&self) -> serde_json::Result<String> {
        let doc = Ecosystem {
            apps: [App {
                name: &self.name,
                script: &self.script,
                cwd: &self.cwd,
                instances: self.instances,
                exec_mode: if self.instances > 1 { "cluster" } else { "fork" },
                max_memory_restart: &self.max_memory_restart,
                env: &self.env,
            }],
        };
        serde_json::to_string_pretty(&doc)
    }

    /// Remote path the descriptor is uploaded to.
    #[must_use]
    pub fn remote_path(&self) -> String {
        format!("{}/{DESCRIPTOR_DIR}/{}.config.json", self.cwd, self.name)
    }
}
