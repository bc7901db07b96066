//! `TerminalReporter`: Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.

use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::OutputContext;

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// - `step()` prints `"  → {message}"` (suppressed when `ctx.quiet`)
/// - `success()` prints `"  ✓ {message}"` (suppressed when `ctx.quiet`)
/// - `warn()` prints `"  ! {message}"` (suppressed when `ctx.quiet`)
///
/// A leading `[host]` tag, as emitted by host sessions, is highlighted so
/// interleaved cluster output stays readable.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    fn highlight(&self, message: &str) -> String {
        match split_host_tag(message) {
            Some((tag, rest)) => {
                let host = tag.trim_start_matches('[').trim_end_matches(']');
                format!("{} {rest}", self.ctx.host_tag(host))
            }
            None => message.to_string(),
        }
    }
}

/// Split `"[host] text"` into `("[host]", "text")`.
#[must_use]
pub fn split_host_tag(message: &str) -> Option<(&str, &str)> {
    if !message.starts_with('[') {
        return None;
    }
    let end = message.find("] ")?;
    Some((&message[..=end], &message[end + 2..]))
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        self.ctx
            .line(&format!("  {} {}", "→".style(self.ctx.styles.step), self.highlight(message)));
    }

    fn success(&self, message: &str) {
        self.ctx
            .line(&format!("  {} {}", "✓".style(self.ctx.styles.success), self.highlight(message)));
    }

    fn warn(&self, message: &str) {
        self.ctx
            .line(&format!("  {} {}", "!".style(self.ctx.styles.warning), self.highlight(message)));
    }
}

/// Reporter that prints nothing, for `--json` runs.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn step(&self, _message: &str) {}
    fn success(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
}
