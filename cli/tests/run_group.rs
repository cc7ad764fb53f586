//! End-to-end tests for supervised runs

#![cfg(unix)]

use cli::{resolve_spec, run_group, RunEnd, RunOptions};
use pgroup_core::process::ProcessCommand;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

fn options(deadline: Option<Duration>) -> RunOptions {
    RunOptions {
        patience: Duration::from_millis(500),
        deadline,
    }
}

#[tokio::test]
async fn test_run_until_natural_exit() {
    let mut cmd = ProcessCommand::new("sh");
    cmd.args(["-c", "exit 3"]);

    let end = run_group(&mut cmd, options(None), std::future::pending())
        .await
        .unwrap();
    match end {
        RunEnd::Exited(exit) => assert_eq!(exit.shell_code(), 3),
        other => panic!("Expected natural exit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_deadline_terminates_group() {
    let mut cmd = ProcessCommand::new("sleep");
    cmd.arg("30");

    let start = Instant::now();
    let end = run_group(
        &mut cmd,
        options(Some(Duration::from_millis(100))),
        std::future::pending(),
    )
    .await
    .unwrap();

    assert!(start.elapsed() < Duration::from_secs(5));
    match end {
        RunEnd::DeadlineReached(exit) => {
            assert_eq!(exit.signal, Some(15));
            assert_eq!(exit.shell_code(), 143);
        }
        other => panic!("Expected deadline, got {:?}", other),
    }
}

#[tokio::test]
async fn test_shutdown_request_terminates_group() {
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let _ = tx.send(());
    });

    let mut cmd = ProcessCommand::new("sleep");
    cmd.arg("30");
    let shutdown = async {
        let _ = rx.await;
    };

    let end = run_group(&mut cmd, options(None), shutdown).await.unwrap();
    assert!(matches!(end, RunEnd::Interrupted(_)));
    assert_eq!(end.exit().signal, Some(15));
}

#[tokio::test]
async fn test_run_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("groups.toml");
    std::fs::write(
        &path,
        r#"
        [[groups]]
        id = "quick"
        command = "sh"
        args = ["-c", "exit 0"]
        gracefulTimeoutSecs = 1
        "#,
    )
    .unwrap();

    let spec = resolve_spec(Some(&path), Some("quick"), &[], None).unwrap();
    assert_eq!(spec.patience(), Duration::from_secs(1));

    let mut cmd = ProcessCommand::from(&spec);
    let end = run_group(&mut cmd, options(None), std::future::pending())
        .await
        .unwrap();
    assert!(end.exit().success());

    let err = resolve_spec(Some(&path), Some("missing"), &[], None).unwrap_err();
    assert!(err.to_string().contains("group 'missing' not found"));
}

#[tokio::test]
async fn test_run_reports_start_failure() {
    let mut cmd = ProcessCommand::new("/var/run/nonexistant");
    let err = run_group(&mut cmd, options(None), std::future::pending())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "PGRP013");
}
