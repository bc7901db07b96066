//! Infrastructure implementation of the `ConfigStore` port.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rollout_common::DeploymentConfig;

use crate::application::ports::ConfigStore;
use crate::domain::{CONFIG_ENV_VAR, ConfigurationError, DEFAULT_CONFIG_FILE, DeployError};

/// Production implementation of `ConfigStore` that uses a YAML file on disk.
pub struct YamlConfigStore {
    path: PathBuf,
}

impl YamlConfigStore {
    /// Resolve the config location: `explicit` (the `--config` flag), then
    /// `ROLLOUT_CONFIG`, then `./rollout.yaml`.
    #[must_use]
    pub fn resolve(explicit: Option<&Path>) -> Self {
        let path = explicit.map(Path::to_path_buf).unwrap_or_else(|| {
            std::env::var_os(CONFIG_ENV_VAR)
                .filter(|v| !v.is_empty())
                .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from)
        });
        Self { path }
    }

    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<DeploymentConfig> {
        let shown = self.path.display().to_string();
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DeployError::from(ConfigurationError::NotFound(shown)).into());
            }
            Err(e) => return Err(e).with_context(|| format!("cannot read {shown}")),
        };
        tracing::debug!(path = %shown, "config loaded");
        serde_yaml::from_str(&content).map_err(|e| {
            DeployError::from(ConfigurationError::Malformed {
                path: shown,
                detail: e.to_string(),
            })
            .into()
        })
    }

    fn create_new(&self, contents: &str) -> Result<bool> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => {
                return Err(e).with_context(|| format!("cannot write {}", self.path.display()));
            }
        };
        file.write_all(contents.as_bytes())
            .with_context(|| format!("cannot write {}", self.path.display()))?;

        // The file may end up holding ssh passwords.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("cannot set permissions on {}", self.path.display()))?;
        }
        Ok(true)
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }
}
