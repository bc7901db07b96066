//! Validation and template for `rollout.yaml`.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use rollout_common::{DeploymentConfig, RemoteCredential, TargetSpec};

use crate::domain::error::ConfigurationError;
use crate::domain::runtime::validate_runtime_version;
use crate::domain::target::{plan_hosts, resolve_target};

/// Default config file name, relative to the project root.
pub const DEFAULT_CONFIG_FILE: &str = "rollout.yaml";

/// Environment variable overriding the config path.
pub const CONFIG_ENV_VAR: &str = "ROLLOUT_CONFIG";

/// Written by `rollout deploy init`.
pub const CONFIG_TEMPLATE: &str = r#"# rollout deployment configuration
defaults:
  runtimeVersion: "20"
  installCommand: npm ci
  buildCommand: npm run build
  keepReleases: 5
  commandTimeoutSecs: 900
  supervisor:
    instances: 1
    maxMemoryRestart: 512M
    env:
      NODE_ENV: production

environments:
  production:
    host: example.com
    username: deploy
    privateKey: ~/.ssh/id_ed25519
    port: 22
    deployPath: /var/www/app
    sharedPaths:
      - .env
    services:
      - name: app
        script: dist/index.js
        port: 3000
    hooks:
      before: []
      after: []

# clusters:
#   fleet:
#     deployPath: /var/www/app
#     services:
#       - { name: api, script: dist/api.js, port: 3000 }
#       - { name: worker, script: dist/worker.js }
#     servers:
#       - { host: 10.0.0.1, username: deploy, privateKey: ~/.ssh/id_ed25519, role: web }
#       - { host: 10.0.0.2, username: deploy, privateKey: ~/.ssh/id_ed25519, role: worker }
#     servicesByRole:
#       web: [api]
#       worker: [worker]
"#;

static SERVICE_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn service_name_regex() -> &'static Regex {
    SERVICE_NAME_REGEX.get_or_init(|| {
        #[allow(clippy::expect_used)] // static pattern
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,63}$").expect("static regex pattern is valid")
    })
}

/// Check a loaded configuration for everything serde cannot express.
///
/// # Errors
///
/// Returns the first [`ConfigurationError`] found.
pub fn validate_config(config: &DeploymentConfig) -> Result<(), ConfigurationError> {
    let defaults = &config.defaults;
    validate_runtime_version(&defaults.runtime_version)?;
    if defaults.keep_releases == 0 {
        return Err(invalid("defaults.keepReleases must be at least 1"));
    }
    if defaults.command_timeout_secs == 0 {
        return Err(invalid("defaults.commandTimeoutSecs must be at least 1"));
    }
    if defaults.supervisor.instances == 0 {
        return Err(invalid("defaults.supervisor.instances must be at least 1"));
    }

    for (name, env) in &config.environments {
        let ctx = format!("environment '{name}'");
        validate_credential(&ctx, &env.credential)?;
        validate_target(&ctx, &env.target)?;
    }

    for (name, cluster) in &config.clusters {
        let ctx = format!("cluster '{name}'");
        if config.environments.contains_key(name) {
            return Err(invalid(&format!(
                "'{name}' is defined as both an environment and a cluster"
            )));
        }
        if cluster.servers.is_empty() {
            return Err(invalid(&format!("{ctx} has no servers")));
        }
        for server in &cluster.servers {
            validate_credential(&ctx, &server.credential)?;
        }
        validate_target(&ctx, &cluster.target)?;
        for (role, wanted) in cluster.services_by_role.iter().flatten() {
            if let Some(service) = wanted
                .iter()
                .find(|w| !cluster.target.services.iter().any(|s| &s.name == *w))
            {
                return Err(ConfigurationError::UnknownRoleService {
                    cluster: name.clone(),
                    role: role.clone(),
                    service: service.clone(),
                });
            }
        }
        plan_hosts(&resolve_target(config, name)?)?;
    }
    Ok(())
}

fn invalid(msg: &str) -> ConfigurationError {
    ConfigurationError::Invalid(msg.to_string())
}

fn validate_credential(ctx: &str, cred: &RemoteCredential) -> Result<(), ConfigurationError> {
    if cred.host.trim().is_empty() || cred.username.trim().is_empty() {
        return Err(invalid(&format!("{ctx}: host and username are required")));
    }
    if cred.host.starts_with('-') || cred.username.starts_with('-') {
        return Err(invalid(&format!(
            "{ctx}: host and username must not start with '-'"
        )));
    }
    if cred.auth().is_none() {
        return Err(invalid(&format!(
            "{ctx} ({}): set exactly one of privateKey or password",
            cred.host
        )));
    }
    Ok(())
}

fn validate_target(ctx: &str, target: &TargetSpec) -> Result<(), ConfigurationError> {
    if !target.deploy_path.starts_with('/') {
        return Err(invalid(&format!(
            "{ctx}: deployPath must be absolute (got '{}')",
            target.deploy_path
        )));
    }
    let mut seen = HashSet::new();
    for service in &target.services {
        if !service_name_regex().is_match(&service.name) {
            return Err(invalid(&format!(
                "{ctx}: invalid service name '{}'",
                service.name
            )));
        }
        if !seen.insert(service.name.as_str()) {
            return Err(invalid(&format!(
                "{ctx}: duplicate service name '{}'",
                service.name
            )));
        }
        if service.script.trim().is_empty() {
            return Err(invalid(&format!(
                "{ctx}: service '{}' has no script",
                service.name
            )));
        }
        if service.instances == Some(0) {
            return Err(invalid(&format!(
                "{ctx}: service '{}' instances must be at least 1",
                service.name
            )));
        }
    }
    for path in &target.shared_paths {
        if path.is_empty() || path.starts_with('/') || path.split('/').any(|seg| seg == "..") {
            return Err(invalid(&format!(
                "{ctx}: sharedPaths entry '{path}' must be a relative path inside the release"
            )));
        }
    }
    Ok(())
}
