//! Release directory management against a recording shell.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use rollout_cli::application::services::release::{
    current_release, cutover, list_releases, prune_releases,
};
use rollout_cli::application::services::releases::list_target_releases;
use rollout_cli::application::services::remote::HostSession;
use rollout_cli::domain::DeployError;
use rollout_common::ReleaseLayout;

use crate::mocks::{
    MockShell, RecordingReporter, Reply, config, credential, err_output, ok_output,
};

const RELEASES: [&str; 7] = [
    "20260101T000000000Z",
    "20260102T000000000Z",
    "20260103T000000000Z",
    "20260104T000000000Z",
    "20260105T000000000Z",
    "20260106T000000000Z",
    "20260107T000000000Z",
];

fn listing(extra: &[&str]) -> String {
    let mut names: Vec<&str> = RELEASES.to_vec();
    names.extend_from_slice(extra);
    names.join("\n") + "\n"
}

fn layout() -> ReleaseLayout {
    ReleaseLayout::from_root("/srv/app")
}

#[tokio::test]
async fn prune_keeps_newest_and_current() {
    let shell = MockShell::new()
        .reply("ls -1", ok_output(&listing(&["lost+found"])))
        .reply(
            "readlink",
            ok_output("/srv/app/releases/20260101T000000000Z\n"),
        );
    let reporter = RecordingReporter::new();
    let cred = credential("web-1");
    let session = HostSession::new(&shell, &reporter, &cred, "web-1");

    let pruned = prune_releases(&session, &layout(), 5).await.unwrap();

    assert_eq!(pruned, vec!["20260102T000000000Z".to_string()]);
    let rm: Vec<String> = shell
        .commands_for("web-1")
        .into_iter()
        .filter(|c| c.starts_with("rm "))
        .collect();
    assert_eq!(
        rm,
        vec!["rm -rf '/srv/app/releases/20260102T000000000Z'".to_string()]
    );
}

#[tokio::test]
async fn prune_with_few_releases_deletes_nothing() {
    let shell = MockShell::new().reply("ls -1", ok_output("20260101T000000000Z\n"));
    let reporter = RecordingReporter::new();
    let cred = credential("web-1");
    let session = HostSession::new(&shell, &reporter, &cred, "web-1");

    let pruned = prune_releases(&session, &layout(), 5).await.unwrap();

    assert!(pruned.is_empty());
    assert!(!shell.commands_for("web-1").iter().any(|c| c.starts_with("rm ")));
}

#[tokio::test]
async fn missing_releases_dir_and_link_read_as_empty() {
    let shell = MockShell::new()
        .reply("ls -1", err_output(2, "ls: cannot access '/srv/app/releases'"))
        .reply("readlink", err_output(1, ""));
    let reporter = RecordingReporter::new();
    let cred = credential("web-1");
    let session = HostSession::new(&shell, &reporter, &cred, "web-1");

    assert!(list_releases(&session, &layout()).await.unwrap().is_empty());
    assert_eq!(current_release(&session, &layout()).await.unwrap(), None);
}

#[tokio::test]
async fn cutover_renames_staging_link_over_current() {
    let shell = MockShell::new();
    let reporter = RecordingReporter::new();
    let cred = credential("web-1");
    let session = HostSession::new(&shell, &reporter, &cred, "web-1");

    cutover(
        &session,
        "20260107T000000000Z",
        "/srv/app/releases/20260107T000000000Z",
        "/srv/app/current",
    )
    .await
    .unwrap();

    assert_eq!(
        shell.commands_for("web-1"),
        vec![
            "ln -sfn '/srv/app/releases/20260107T000000000Z' \
             '/srv/app/current.tmp-20260107T000000000Z'"
                .to_string(),
            "mv -T '/srv/app/current.tmp-20260107T000000000Z' '/srv/app/current'".to_string(),
        ]
    );
}

#[tokio::test]
async fn failed_link_leaves_current_alone() {
    let shell = MockShell::new().reply("ln -sfn", err_output(1, "ln: Permission denied"));
    let reporter = RecordingReporter::new();
    let cred = credential("web-1");
    let session = HostSession::new(&shell, &reporter, &cred, "web-1");

    let err = cutover(&session, "r", "/srv/app/releases/r", "/srv/app/current")
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<DeployError>(),
        Some(DeployError::RemoteExecution { .. })
    ));
    assert!(!shell.commands_for("web-1").iter().any(|c| c.starts_with("mv ")));
}

#[tokio::test]
async fn releases_listing_reports_unreachable_hosts_per_entry() {
    let yaml = r"
defaults: { runtimeVersion: '20' }
clusters:
  fleet:
    deployPath: /srv/app
    servers:
      - { host: 10.0.0.1, username: deploy, privateKey: /keys/id }
      - { host: 10.0.0.2, username: deploy, privateKey: /keys/id, port: 2222 }
";
    let shell = MockShell::new()
        .reply_on(
            "10.0.0.1",
            "ls -1",
            Reply::Output(ok_output(&listing(&["notes.txt"]))),
        )
        .reply_on(
            "10.0.0.1",
            "readlink",
            Reply::Output(ok_output("/srv/app/releases/20260107T000000000Z\n")),
        )
        .reply_on("10.0.0.2", "ls -1", Reply::Unreachable);
    let reporter = RecordingReporter::new();

    let hosts = list_target_releases(&shell, &reporter, &config(yaml), "fleet")
        .await
        .unwrap();

    assert_eq!(hosts.len(), 2);
    let first = &hosts[0];
    assert_eq!(first.host, "10.0.0.1");
    assert_eq!(first.releases.len(), 7);
    assert_eq!(first.releases[0], "20260107T000000000Z");
    assert_eq!(first.current.as_deref(), Some("20260107T000000000Z"));
    assert!(first.error.is_none());

    let second = &hosts[1];
    assert_eq!(second.host, "10.0.0.2:2222");
    assert!(second.error.as_deref().unwrap().contains("Connection refused"));
}
