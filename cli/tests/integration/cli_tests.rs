//! Integration tests for the CLI skeleton: help, version and global flags.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn rollout() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("rollout"));
    cmd.env("NO_COLOR", "1").env_remove("ROLLOUT_CONFIG");
    cmd
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    // clap with arg_required_else_help shows help on stderr and exits 2
    rollout()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Release-based deployments over ssh"));
}

#[test]
fn test_cli_help_flag_shows_help() {
    rollout()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("version"));
}

#[test]
fn test_deploy_help_lists_subcommands() {
    rollout()
        .args(["deploy", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("releases"));
}

#[test]
fn test_any_no_color_value_is_accepted() {
    for value in ["1", "true", "yes", ""] {
        rollout()
            .env("NO_COLOR", value)
            .arg("version")
            .assert()
            .success()
            .stdout(predicate::str::contains("rollout v"));
    }
}

#[test]
fn test_no_color_env_leaves_deploy_init_exit_codes_alone() {
    let dir = tempfile::tempdir().expect("tempdir");
    for _ in 0..2 {
        rollout()
            .current_dir(dir.path())
            .env("NO_COLOR", "1")
            .args(["deploy", "init"])
            .assert()
            .code(0);
    }
}

#[test]
fn test_cli_version_flag_shows_version() {
    rollout()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rollout"));
}

#[test]
fn test_version_command_shows_version() {
    rollout()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(concat!(
            "rollout v",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = rollout()
        .args(["version", "--json"])
        .output()
        .expect("run rollout");
    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_unknown_subcommand_fails() {
    rollout()
        .arg("launch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_run_requires_a_name() {
    rollout()
        .args(["deploy", "run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("<NAME>"));
}

#[test]
fn test_zero_timeout_is_rejected() {
    rollout()
        .args(["deploy", "run", "production", "--timeout", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--timeout"));
}
