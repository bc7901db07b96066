//! Application service: configuration use-cases.

use anyhow::Result;
use rollout_common::DeploymentConfig;

use crate::application::ports::ConfigStore;
use crate::domain::{CONFIG_TEMPLATE, DeployError, validate_config};

/// Outcome of [`init_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Created,
    /// A file was already there and was left untouched.
    AlreadyExists,
}

/// Load and validate the configuration.
///
/// # Errors
///
/// Returns `DeployError::Configuration` for a missing, unparsable or
/// inconsistent file.
pub fn load_config(store: &impl ConfigStore) -> Result<DeploymentConfig> {
    let config = store.load()?;
    validate_config(&config).map_err(DeployError::from)?;
    Ok(config)
}

/// Write the template configuration unless a file already exists.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn init_config(store: &impl ConfigStore) -> Result<InitOutcome> {
    if store.create_new(CONFIG_TEMPLATE)? {
        Ok(InitOutcome::Created)
    } else {
        Ok(InitOutcome::AlreadyExists)
    }
}
