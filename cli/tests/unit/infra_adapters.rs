//! Infrastructure adapters: the tokio process runner, the ssh transport and
//! the YAML config store.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use std::time::{Duration, Instant};

use rollout_cli::application::ports::{CommandRunner, FileSync, RemoteShell, TimedOut};
use rollout_cli::application::services::config_service::{InitOutcome, init_config, load_config};
use rollout_cli::domain::RemoteCommand;
use rollout_cli::infra::command_runner::TokioCommandRunner;
use rollout_cli::infra::config::YamlConfigStore;
use rollout_cli::infra::ssh::SshShell;
use rollout_common::RemoteCredential;

use crate::mocks::{RecordingRunner, credential};

// ── TokioCommandRunner ────────────────────────────────────────────────────────

#[cfg(unix)]
#[tokio::test]
async fn runner_kills_process_after_timeout() {
    let runner = TokioCommandRunner::new(Duration::from_millis(100));
    let started = Instant::now();

    let err = runner.run("sleep", &["5"], &[], None).await.unwrap_err();

    let timed_out = err.downcast_ref::<TimedOut>().expect("TimedOut");
    assert_eq!(timed_out.program, "sleep");
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[cfg(unix)]
#[tokio::test]
async fn runner_captures_exit_status_and_output() {
    let runner = TokioCommandRunner::new(Duration::from_secs(10));

    let out = runner
        .run("sh", &["-c", "echo out; echo err >&2; exit 3"], &[], None)
        .await
        .unwrap();

    assert_eq!(out.status.code(), Some(3));
    assert_eq!(String::from_utf8_lossy(&out.stdout), "out\n");
    assert_eq!(String::from_utf8_lossy(&out.stderr), "err\n");
}

#[cfg(unix)]
#[tokio::test]
async fn runner_pipes_stdin_and_env() {
    let runner = TokioCommandRunner::new(Duration::from_secs(10));

    let out = runner
        .run(
            "sh",
            &["-c", "printf '%s:' \"$GREETING\"; cat"],
            &[("GREETING", "hello")],
            Some(&b"body"[..]),
        )
        .await
        .unwrap();

    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "hello:body");
}

#[tokio::test]
async fn runner_reports_missing_program() {
    let runner = TokioCommandRunner::new(Duration::from_secs(1));
    let err = runner
        .run("rollout-test-no-such-binary", &[], &[], None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("failed to spawn"));
}

// ── SshShell ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn exec_renders_one_quoted_remote_argument() {
    let runner = RecordingRunner::default();
    let shell = SshShell::new(&runner, Vec::new());
    let cmd = RemoteCommand::exec("mkdir", ["-p", "/srv/my app/releases/x"]);

    shell.exec(&credential("web-1"), &cmd).await.unwrap();

    let spawn = &runner.spawns()[0];
    assert_eq!(spawn.program, "ssh");
    let tail: Vec<&str> = spawn.args.iter().rev().take(3).map(String::as_str).collect();
    assert_eq!(
        tail,
        vec!["mkdir -p '/srv/my app/releases/x'", "deploy@web-1", "--"]
    );
    assert!(spawn.stdin.is_none());
    assert!(spawn.env.is_empty());
}

#[tokio::test]
async fn upload_streams_contents_over_stdin() {
    let runner = RecordingRunner::default();
    let shell = SshShell::new(&runner, Vec::new());

    shell
        .upload(&credential("web-1"), "/srv/app/.rollout/api.config.json", b"{}")
        .await
        .unwrap();

    let spawn = &runner.spawns()[0];
    assert_eq!(
        spawn.args.last().unwrap(),
        "cat > '/srv/app/.rollout/api.config.json'"
    );
    assert_eq!(spawn.stdin.as_deref(), Some(&b"{}"[..]));
}

#[tokio::test]
async fn password_credentials_go_through_sshpass_env() {
    let runner = RecordingRunner::default();
    let shell = SshShell::new(&runner, vec!["/rollout.yaml".to_string()]);
    let cred = RemoteCredential {
        private_key: None,
        password: Some("s3cret".into()),
        ..credential("web-1")
    };

    shell
        .sync(&cred, Path::new("/work/app"), "/srv/app/releases/x")
        .await
        .unwrap();

    let spawn = &runner.spawns()[0];
    assert_eq!(spawn.program, "sshpass");
    assert_eq!(&spawn.args[..2], &["-e".to_string(), "rsync".to_string()]);
    assert_eq!(spawn.env, vec![("SSHPASS".to_string(), "s3cret".to_string())]);
    assert!(!spawn.args.iter().any(|a| a.contains("s3cret")));
    assert!(spawn.args.contains(&"--exclude=/rollout.yaml".to_string()));
    assert_eq!(spawn.args.last().unwrap(), "deploy@web-1:/srv/app/releases/x/");
}

#[tokio::test]
async fn ssh_level_failure_is_an_error() {
    let runner = RecordingRunner::exiting_with(255);
    let shell = SshShell::new(&runner, Vec::new());
    let cmd = RemoteCommand::exec("ls", ["-1", "/srv/app/releases"]);

    let err = shell.exec(&credential("web-1"), &cmd).await.unwrap_err();

    assert!(err.to_string().contains("Connection refused"), "got: {err}");
}

#[tokio::test]
async fn remote_exit_status_is_passed_through() {
    let runner = RecordingRunner::exiting_with(2);
    let shell = SshShell::new(&runner, Vec::new());
    let cmd = RemoteCommand::exec("ls", ["-1", "/srv/app/releases"]);

    let out = shell.exec(&credential("web-1"), &cmd).await.unwrap();

    assert_eq!(out.status.code(), Some(2));
}

// ── YamlConfigStore ───────────────────────────────────────────────────────────

#[test]
fn init_twice_keeps_the_first_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rollout.yaml");
    let store = YamlConfigStore::at(&path);

    assert_eq!(init_config(&store).unwrap(), InitOutcome::Created);
    std::fs::write(&path, "# edited\n").unwrap();
    assert_eq!(init_config(&store).unwrap(), InitOutcome::AlreadyExists);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "# edited\n");
}

#[test]
fn generated_template_loads_and_validates() {
    let dir = tempfile::tempdir().unwrap();
    let store = YamlConfigStore::at(dir.path().join("rollout.yaml"));
    init_config(&store).unwrap();

    let config = load_config(&store).unwrap();

    assert!(config.environments.contains_key("production"));
}
