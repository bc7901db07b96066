//! Structured remote commands.
//!
//! Everything the deployer runs on a host is a [`RemoteCommand`]. Program
//! names, paths and arguments are quoted token by token when the command is
//! rendered for the remote shell; only [`RemoteCommand::Script`] carries raw
//! shell text, and that text is operator-authored (hooks, install/build
//! commands).

use std::fmt;

/// Quote `s` for a POSIX shell.
///
/// Strings made only of alphanumerics, `-`, `_` and `.` pass through; anything
/// else is wrapped in single quotes with embedded quotes escaped as `'\''`.
#[must_use]
pub fn shell_escape(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    if s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// A command to run on a remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCommand {
    /// A program with an argument vector; every token is quoted.
    Exec {
        program: String,
        args: Vec<String>,
        cwd: Option<String>,
    },
    /// Trusted free-form shell text, run with `bash -lc`.
    Script { script: String, cwd: Option<String> },
}

impl RemoteCommand {
    /// Build an [`RemoteCommand::Exec`].
    pub fn exec<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Exec {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
        }
    }

    /// Build a [`RemoteCommand::Script`].
    pub fn script(script: impl Into<String>) -> Self {
        Self::Script {
            script: script.into(),
            cwd: None,
        }
    }

    /// Run the command from `dir` instead of the login directory.
    #[must_use]
    pub fn in_dir(mut self, dir: &str) -> Self {
        match &mut self {
            Self::Exec { cwd, .. } | Self::Script { cwd, .. } => *cwd = Some(dir.to_string()),
        }
        self
    }

    /// Render as a single command line for the remote login shell.
    #[must_use]
    pub fn render(&self) -> String {
        let (body, cwd) = match self {
            Self::Exec { program, args, cwd } => {
                let mut tokens = Vec::with_capacity(args.len() + 1);
                tokens.push(shell_escape(program));
                tokens.extend(args.iter().map(|a| shell_escape(a)));
                (tokens.join(" "), cwd)
            }
            Self::Script { script, cwd } => (format!("bash -lc {}", shell_escape(script)), cwd),
        };
        match cwd {
            Some(dir) => format!("cd {} && {body}", shell_escape(dir)),
            None => body,
        }
    }

    /// Short description for progress output and error messages.
    ///
    /// Scripts are shown as written; exec commands as their unquoted argv.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Exec { program, args, .. } => {
                let mut s = program.clone();
                for a in args {
                    s.push(' ');
                    s.push_str(a);
                }
                s
            }
            Self::Script { script, .. } => script.clone(),
        }
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
