//! Application context: unified state passed to every command handler.
//!
//! `AppContext` is built once from the global flags. Adding a cross-cutting
//! concern means one field here, with no command signature changes.

use std::path::PathBuf;
use std::time::Duration;

use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::ssh::SshShell;
use crate::output::OutputContext;

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
    /// Explicit config path (`--config`).
    pub config: Option<PathBuf>,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    config: Option<PathBuf>,
}

impl AppContext {
    #[must_use]
    pub fn new(flags: AppFlags) -> Self {
        let mode = if flags.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        // JSON output owns stdout; progress lines would corrupt it.
        let quiet = flags.quiet || flags.json;
        Self {
            output: OutputContext::new(flags.no_color, quiet),
            mode,
            config: flags.config,
        }
    }

    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// The config store selected by `--config`, `ROLLOUT_CONFIG` or the default path.
    #[must_use]
    pub fn config_store(&self) -> YamlConfigStore {
        YamlConfigStore::resolve(self.config.as_deref())
    }

    /// ssh/rsync transport whose every process is bounded by `timeout`.
    #[must_use]
    pub fn ssh_shell(
        &self,
        timeout: Duration,
        sync_excludes: Vec<String>,
    ) -> SshShell<TokioCommandRunner> {
        SshShell::new(TokioCommandRunner::new(timeout), sync_excludes)
    }
}
