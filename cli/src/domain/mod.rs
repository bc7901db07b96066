//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod release;
pub mod remote;
pub mod runtime;
pub mod service;
pub mod target;

pub use config::{CONFIG_ENV_VAR, CONFIG_TEMPLATE, DEFAULT_CONFIG_FILE, validate_config};
pub use error::{ConfigurationError, DeployError};
pub use pipeline::{DeployReport, DeployStep, HostReport, HostState};
pub use release::{ReleaseIdAllocator, select_prunable};
pub use remote::RemoteCommand;
pub use service::{SupervisorDescriptor, render_descriptor};
pub use target::{HostPlan, Target, plan_hosts, resolve_target};
