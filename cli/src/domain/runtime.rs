//! Runtime version manager scripts (nvm).
//!
//! Pure string builders. The runtime version is validated before it is
//! interpolated; install/build/hook commands are operator-authored scripts.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::error::ConfigurationError;

/// Loads nvm into a non-interactive shell.
pub const NVM_PRELUDE: &str = r#"export NVM_DIR="${NVM_DIR:-$HOME/.nvm}" && . "$NVM_DIR/nvm.sh""#;

static VERSION_REGEX: OnceLock<Regex> = OnceLock::new();

fn version_regex() -> &'static Regex {
    VERSION_REGEX.get_or_init(|| {
        #[allow(clippy::expect_used)] // static pattern
        Regex::new(r"^[A-Za-z0-9._/*-]+$").expect("static regex pattern is valid")
    })
}

/// Checks that `version` is a plain version-manager token (`20`, `lts/iron`, `18.19.0`).
///
/// # Errors
///
/// Returns [`ConfigurationError::Invalid`] for empty input or shell metacharacters.
pub fn validate_runtime_version(version: &str) -> Result<(), ConfigurationError> {
    if version_regex().is_match(version) {
        Ok(())
    } else {
        Err(ConfigurationError::Invalid(format!(
            "runtimeVersion '{version}' must match [A-Za-z0-9._/*-]+"
        )))
    }
}

/// Script that installs (or re-selects) `version`.
#[must_use]
pub fn install_runtime_script(version: &str) -> String {
    format!("{NVM_PRELUDE} && nvm install {version}")
}

/// Wrap `script` so it runs with `version` active.
///
/// The prelude and `script` are chained with `&&`, so a failure anywhere
/// aborts the remainder.
#[must_use]
pub fn with_runtime(version: &str, script: &str) -> String {
    format!("{NVM_PRELUDE} && nvm use {version} >/dev/null && {script}")
}
