//! Infrastructure implementation of the `RemoteShell` and `FileSync` ports
//! over OpenSSH.
//!
//! Every invocation is built as an argument vector; nothing here composes a
//! local shell command line. Password credentials go through `sshpass -e`,
//! which reads the password from `SSHPASS` so it never appears in argv.

use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::Result;
use rollout_common::{Auth, RemoteCredential};

use crate::application::ports::{CommandRunner, FileSync, RemoteShell};
use crate::domain::RemoteCommand;
use crate::domain::remote::shell_escape;

/// Seconds ssh waits for the TCP connection before giving up.
pub const CONNECT_TIMEOUT_SECS: u32 = 15;

/// Exit status ssh uses for its own failures (connection, authentication).
pub const SSH_FAILURE_EXIT: i32 = 255;

/// Paths never copied into a release.
pub const SYNC_EXCLUDES: &[&str] = &["node_modules", ".git", "dist", "build", "*.log", ".env"];

/// A program plus its arguments and extra environment, ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    fn arg_refs(&self) -> Vec<&str> {
        self.args.iter().map(String::as_str).collect()
    }

    fn env_refs(&self) -> Vec<(&str, &str)> {
        self.env
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// Expand a leading `~` to the home directory.
#[must_use]
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map_or_else(|| PathBuf::from(path), |h| h.join(rest)),
        None if path == "~" => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

/// `-o` options and identity shared by ssh and rsync's ssh transport.
#[must_use]
pub fn ssh_options(credential: &RemoteCredential) -> Vec<String> {
    let mut opts = vec![
        "-p".to_string(),
        credential.port().to_string(),
        "-o".to_string(),
        "StrictHostKeyChecking=accept-new".to_string(),
        "-o".to_string(),
        format!("ConnectTimeout={CONNECT_TIMEOUT_SECS}"),
    ];
    if let Some(Auth::Key(key)) = credential.auth() {
        opts.push("-i".to_string());
        opts.push(expand_home(key).to_string_lossy().into_owned());
        opts.push("-o".to_string());
        opts.push("BatchMode=yes".to_string());
    }
    opts
}

/// Wrap `program args` in `sshpass -e` when the credential uses a password.
fn authenticated(credential: &RemoteCredential, program: &str, args: Vec<String>) -> Invocation {
    match credential.auth() {
        Some(Auth::Password(password)) => {
            let mut wrapped = vec!["-e".to_string(), program.to_string()];
            wrapped.extend(args);
            Invocation {
                program: "sshpass".to_string(),
                args: wrapped,
                env: vec![("SSHPASS".to_string(), password.to_string())],
            }
        }
        _ => Invocation {
            program: program.to_string(),
            args,
            env: Vec::new(),
        },
    }
}

/// Build the ssh invocation that runs `remote_command` on the host.
#[must_use]
pub fn ssh_invocation(credential: &RemoteCredential, remote_command: &str) -> Invocation {
    let mut args = ssh_options(credential);
    args.push("--".to_string());
    args.push(credential.destination());
    args.push(remote_command.to_string());
    authenticated(credential, "ssh", args)
}

/// Build the rsync invocation mirroring `local_root` into `remote_path`.
#[must_use]
pub fn rsync_invocation(
    credential: &RemoteCredential,
    local_root: &Path,
    remote_path: &str,
    extra_excludes: &[String],
) -> Invocation {
    let transport = std::iter::once("ssh".to_string())
        .chain(ssh_options(credential))
        .map(|tok| shell_escape(&tok))
        .collect::<Vec<_>>()
        .join(" ");
    let mut args = vec![
        "-az".to_string(),
        "--delete".to_string(),
        // Pass the remote path to the remote side verbatim, without word splitting.
        "--protect-args".to_string(),
        "-e".to_string(),
        transport,
    ];
    for pattern in SYNC_EXCLUDES
        .iter()
        .map(|s| (*s).to_string())
        .chain(extra_excludes.iter().cloned())
    {
        args.push(format!("--exclude={pattern}"));
    }
    // Trailing slash: copy the contents, not the directory itself.
    let mut source = local_root.to_string_lossy().into_owned();
    if !source.ends_with('/') {
        source.push('/');
    }
    args.push(source);
    args.push(format!(
        "{}:{}/",
        credential.destination(),
        remote_path.trim_end_matches('/')
    ));
    authenticated(credential, "rsync", args)
}

/// `RemoteShell` and `FileSync` backed by the `ssh` and `rsync` binaries.
pub struct SshShell<C> {
    runner: C,
    /// Extra rsync excludes, e.g. the local config file.
    excludes: Vec<String>,
}

impl<C: CommandRunner> SshShell<C> {
    #[must_use]
    pub fn new(runner: C, excludes: Vec<String>) -> Self {
        Self { runner, excludes }
    }

    async fn spawn(&self, invocation: &Invocation, stdin: Option<&[u8]>) -> Result<Output> {
        self.runner
            .run(
                &invocation.program,
                &invocation.arg_refs(),
                &invocation.env_refs(),
                stdin,
            )
            .await
    }

    /// Like `spawn`, but an ssh-level failure is an error rather than an
    /// exit status, so callers never mistake an unreachable host for a
    /// command that merely failed.
    async fn spawn_ssh(&self, invocation: &Invocation, stdin: Option<&[u8]>) -> Result<Output> {
        let output = self.spawn(invocation, stdin).await?;
        if output.status.code() == Some(SSH_FAILURE_EXIT) {
            anyhow::bail!(
                "ssh failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output)
    }
}

impl<C: CommandRunner> RemoteShell for SshShell<C> {
    async fn exec(
        &self,
        credential: &RemoteCredential,
        command: &RemoteCommand,
    ) -> Result<Output> {
        self.spawn_ssh(&ssh_invocation(credential, &command.render()), None)
            .await
    }

    async fn upload(
        &self,
        credential: &RemoteCredential,
        remote_path: &str,
        contents: &[u8],
    ) -> Result<Output> {
        let command = format!("cat > {}", shell_escape(remote_path));
        self.spawn_ssh(&ssh_invocation(credential, &command), Some(contents))
            .await
    }
}

impl<C: CommandRunner> FileSync for SshShell<C> {
    async fn sync(
        &self,
        credential: &RemoteCredential,
        local_root: &Path,
        remote_path: &str,
    ) -> Result<Output> {
        self.spawn(
            &rsync_invocation(credential, local_root, remote_path, &self.excludes),
            None,
        )
        .await
    }
}
