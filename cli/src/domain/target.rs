//! Deployment target resolution.
//!
//! Turns a target name into the list of hosts to deploy, each with the
//! services it runs. Pure functions only; every error here is raised before
//! any remote side effect.

use rollout_common::{
    ClusterProfile, DeploymentConfig, EnvironmentProfile, RemoteCredential, ServiceSpec,
    TargetSpec,
};
use rollout_common::config::DEFAULT_SSH_PORT;

use crate::domain::error::ConfigurationError;

/// A resolved deployment target.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Environment {
        name: &'a str,
        profile: &'a EnvironmentProfile,
    },
    Cluster {
        name: &'a str,
        profile: &'a ClusterProfile,
    },
}

impl Target<'_> {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Environment { name, .. } | Self::Cluster { name, .. } => name,
        }
    }

    #[must_use]
    pub fn is_cluster(&self) -> bool {
        matches!(self, Self::Cluster { .. })
    }
}

/// One host's share of a deployment: where to connect and what to deploy.
#[derive(Debug, Clone)]
pub struct HostPlan {
    /// Display name used in progress output and error reports.
    pub label: String,
    pub profile: EnvironmentProfile,
}

/// Names of every environment and cluster, sorted.
#[must_use]
pub fn target_names(config: &DeploymentConfig) -> (Vec<String>, Vec<String>) {
    (
        config.environments.keys().cloned().collect(),
        config.clusters.keys().cloned().collect(),
    )
}

/// Look `name` up among environments, then clusters.
///
/// # Errors
///
/// Returns [`ConfigurationError::UnknownTarget`] listing the known names.
pub fn resolve_target<'a>(
    config: &'a DeploymentConfig,
    name: &str,
) -> Result<Target<'a>, ConfigurationError> {
    if let Some((name, profile)) = config.environments.get_key_value(name) {
        return Ok(Target::Environment { name, profile });
    }
    if let Some((name, profile)) = config.clusters.get_key_value(name) {
        return Ok(Target::Cluster { name, profile });
    }
    let (environments, clusters) = target_names(config);
    Err(ConfigurationError::UnknownTarget {
        name: name.to_string(),
        environments,
        clusters,
    })
}

/// Display label for a host: the hostname, plus the port when it is not 22.
#[must_use]
pub fn host_label(credential: &RemoteCredential) -> String {
    match credential.port() {
        DEFAULT_SSH_PORT => credential.host.clone(),
        port => format!("{}:{port}", credential.host),
    }
}

/// Expand a target into per-host plans, in config order.
///
/// # Errors
///
/// Returns an error when a cluster role references an unknown service or a
/// host's role has no entry in `servicesByRole`.
pub fn plan_hosts(target: &Target<'_>) -> Result<Vec<HostPlan>, ConfigurationError> {
    match target {
        Target::Environment { profile, .. } => Ok(vec![HostPlan {
            label: host_label(&profile.credential),
            profile: (*profile).clone(),
        }]),
        Target::Cluster { name, profile } => profile
            .servers
            .iter()
            .map(|server| {
                let services = services_for_role(name, profile, server.role.as_deref())?;
                Ok(HostPlan {
                    label: host_label(&server.credential),
                    profile: EnvironmentProfile {
                        credential: server.credential.clone(),
                        target: TargetSpec {
                            services,
                            ..profile.target.clone()
                        },
                    },
                })
            })
            .collect(),
    }
}

/// Select the services a host with `role` runs.
///
/// A host without a role, or a cluster without a role map, gets the whole
/// catalog. Selected services keep catalog order.
///
/// # Errors
///
/// Returns an error if the role map names a service missing from the
/// catalog, or if `role` is not a key of the role map.
pub fn services_for_role(
    cluster: &str,
    profile: &ClusterProfile,
    role: Option<&str>,
) -> Result<Vec<ServiceSpec>, ConfigurationError> {
    let catalog = &profile.target.services;
    let (Some(role), Some(by_role)) = (role, profile.services_by_role.as_ref()) else {
        return Ok(catalog.clone());
    };
    let wanted = by_role.get(role).ok_or_else(|| {
        ConfigurationError::Invalid(format!(
            "cluster '{cluster}' has a server with role '{role}' but no servicesByRole entry for it"
        ))
    })?;
    for service in wanted {
        if !catalog.iter().any(|s| &s.name == service) {
            return Err(ConfigurationError::UnknownRoleService {
                cluster: cluster.to_string(),
                role: role.to_string(),
                service: service.clone(),
            });
        }
    }
    Ok(catalog
        .iter()
        .filter(|s| wanted.contains(&s.name))
        .cloned()
        .collect())
}
