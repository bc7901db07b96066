pub mod config;
pub mod types;

pub use config::{
    Auth, ClusterProfile, ClusterServer, Defaults, DeploymentConfig, EnvironmentProfile, Hooks,
    ReleaseLayout, RemoteCredential, ServiceSpec, SupervisorDefaults, TargetSpec,
};
pub use types::*;
