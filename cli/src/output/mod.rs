//! Output formatting module

pub mod human;
pub mod json;
pub mod reporter;
pub mod styles;

use console::Term;
use owo_colors::OwoColorize as _;
pub use styles::Styles;

/// Output context carrying styling and the quiet flag.
///
/// Everything a command prints for humans goes through here, so `--quiet`
/// silences it all in one place. Errors still reach stderr.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    ///
    /// Colors need a terminal on stdout and no non-empty `NO_COLOR`.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let env_no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        let use_colors = !no_color && !env_no_color && Term::stdout().is_term();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self { styles, quiet }
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        self.line(&format!("  {} {msg}", "✓".style(self.styles.success)));
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        self.line(&format!("  {} {msg}", "⚠".style(self.styles.warning)));
    }

    /// Print an error message prefixed with `✗` to stderr. Never suppressed.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// Print an info message prefixed with `ℹ`. Suppressed when `quiet`.
    pub fn info(&self, msg: &str) {
        self.line(&format!("  {} {msg}", "ℹ".style(self.styles.info)));
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        self.line(&format!("  {}", msg.style(self.styles.header)));
    }

    /// Print a pre-formatted line as is. Suppressed when `quiet`.
    pub fn line(&self, text: &str) {
        if !self.quiet {
            println!("{text}");
        }
    }

    /// Print an empty line. Suppressed when `quiet`.
    pub fn blank(&self) {
        self.line("");
    }

    /// `[host]` in the host style, the prefix of every per-host line.
    #[must_use]
    pub fn host_tag(&self, host: &str) -> String {
        format!("[{host}]").style(self.styles.host).to_string()
    }
}
