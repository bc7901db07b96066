//! Shared mock infrastructure for unit tests.
//!
//! Recording implementations of the port traits. Each mock keeps a log of
//! what it was asked to do so tests can assert on order and absence of
//! remote side effects.

#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use std::process::{ExitStatus, Output};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use rollout_cli::application::ports::{
    CommandRunner, FileSync, ProgressReporter, RemoteShell, TimedOut,
};
use rollout_cli::domain::RemoteCommand;
use rollout_common::{DeploymentConfig, RemoteCredential};

// ── Output helpers ────────────────────────────────────────────────────────────

/// Build an `ExitStatus` from a logical exit code (0 = success).
///
/// On Unix the raw wait-status encodes the exit code in bits 8–15, so we shift.
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    ExitStatus::from_raw(code as u32)
}

pub fn ok_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

pub fn noisy_output(stderr: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

pub fn err_output(code: i32, stderr: &str) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

pub fn config(yaml: &str) -> DeploymentConfig {
    serde_yaml::from_str(yaml).expect("test config parses")
}

pub fn credential(host: &str) -> RemoteCredential {
    RemoteCredential {
        host: host.to_string(),
        username: "deploy".to_string(),
        private_key: Some("/keys/id".to_string()),
        password: None,
        port: None,
    }
}

// ── Remote shell ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub enum Reply {
    Output(Output),
    TimedOut,
    Unreachable,
}

struct Rule {
    host: Option<String>,
    needle: String,
    reply: Reply,
}

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub host: String,
    pub command: String,
}

/// `RemoteShell` that answers from a rule list and records every call.
///
/// The first rule whose needle occurs in the rendered command (and whose
/// host matches, if set) decides the reply; unmatched commands succeed
/// with empty output.
#[derive(Default)]
pub struct MockShell {
    rules: Vec<Rule>,
    calls: Mutex<Vec<Call>>,
    uploads: Mutex<Vec<(String, String, String)>>,
}

impl MockShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, needle: &str, output: Output) -> Self {
        self.rules.push(Rule {
            host: None,
            needle: needle.to_string(),
            reply: Reply::Output(output),
        });
        self
    }

    pub fn reply_on(mut self, host: &str, needle: &str, reply: Reply) -> Self {
        self.rules.push(Rule {
            host: Some(host.to_string()),
            needle: needle.to_string(),
            reply,
        });
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands_for(&self, host: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.host == host)
            .map(|c| c.command)
            .collect()
    }

    /// `(host, path, contents)` of every upload.
    pub fn uploads(&self) -> Vec<(String, String, String)> {
        self.uploads.lock().unwrap().clone()
    }

    fn answer(&self, host: &str, command: &str) -> Result<Output> {
        self.calls.lock().unwrap().push(Call {
            host: host.to_string(),
            command: command.to_string(),
        });
        let rule = self.rules.iter().find(|r| {
            command.contains(&r.needle) && r.host.as_deref().is_none_or(|h| h == host)
        });
        match rule.map(|r| r.reply.clone()) {
            None => Ok(ok_output("")),
            Some(Reply::Output(out)) => Ok(out),
            Some(Reply::TimedOut) => Err(TimedOut {
                program: "ssh".to_string(),
                timeout: Duration::from_secs(5),
            }
            .into()),
            Some(Reply::Unreachable) => anyhow::bail!("ssh: connect to host {host}: Connection refused"),
        }
    }
}

impl RemoteShell for MockShell {
    async fn exec(&self, credential: &RemoteCredential, command: &RemoteCommand) -> Result<Output> {
        self.answer(&credential.host, &command.render())
    }

    async fn upload(
        &self,
        credential: &RemoteCredential,
        remote_path: &str,
        contents: &[u8],
    ) -> Result<Output> {
        self.uploads.lock().unwrap().push((
            credential.host.clone(),
            remote_path.to_string(),
            String::from_utf8_lossy(contents).into_owned(),
        ));
        self.answer(&credential.host, &format!("upload {remote_path}"))
    }
}

// ── File sync ─────────────────────────────────────────────────────────────────

/// `FileSync` that records transfers and fails for listed hosts.
#[derive(Default)]
pub struct MockSync {
    failing_hosts: Vec<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(host: &str) -> Self {
        Self {
            failing_hosts: vec![host.to_string()],
            calls: Mutex::default(),
        }
    }

    /// `(host, remote_path)` of every transfer.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl FileSync for MockSync {
    async fn sync(
        &self,
        credential: &RemoteCredential,
        _local_root: &Path,
        remote_path: &str,
    ) -> Result<Output> {
        self.calls
            .lock()
            .unwrap()
            .push((credential.host.clone(), remote_path.to_string()));
        if self.failing_hosts.contains(&credential.host) {
            return Ok(err_output(23, "rsync: some files could not be transferred"));
        }
        Ok(ok_output(""))
    }
}

// ── Reporter ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.lines.lock().unwrap().push(format!("step {message}"));
    }
    fn success(&self, message: &str) {
        self.lines.lock().unwrap().push(format!("ok {message}"));
    }
    fn warn(&self, message: &str) {
        self.lines.lock().unwrap().push(format!("warn {message}"));
    }
}

// ── Command runner ────────────────────────────────────────────────────────────

/// One recorded local process spawn.
#[derive(Debug, Clone)]
pub struct Spawn {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub stdin: Option<Vec<u8>>,
}

/// `CommandRunner` that records spawns and exits with a fixed status
/// (zero by default).
#[derive(Default)]
pub struct RecordingRunner {
    pub spawns: Mutex<Vec<Spawn>>,
    pub exit_code: i32,
}

impl RecordingRunner {
    pub fn exiting_with(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Self::default()
        }
    }

    pub fn spawns(&self) -> Vec<Spawn> {
        self.spawns.lock().unwrap().clone()
    }

    fn record(&self, program: &str, args: &[&str], env: &[(&str, &str)], stdin: Option<&[u8]>) {
        self.spawns.lock().unwrap().push(Spawn {
            program: program.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
            env: env
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            stdin: stdin.map(<[u8]>::to_vec),
        });
    }
}

impl CommandRunner for &RecordingRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
        stdin: Option<&[u8]>,
    ) -> Result<Output> {
        self.record(program, args, env, stdin);
        match self.exit_code {
            0 => Ok(ok_output("")),
            code => Ok(err_output(code, "ssh: connect to host web-1 port 22: Connection refused")),
        }
    }
}
