//! Integration tests for the persistent shell session
//!
//! A local `sh` stands in for `adb shell`: both read command text on stdin
//! and write results on stdout.

use droidmon_core::adb::{CancellationToken, RemoteShellSession, SessionState, ShellLauncher};
use std::sync::Arc;
use std::time::Duration;

fn local_session() -> RemoteShellSession {
    RemoteShellSession::new(ShellLauncher::new("sh", Vec::new()))
}

#[tokio::test]
async fn test_run_returns_exact_output() {
    let session = local_session();
    let cancel = CancellationToken::new();

    let output = session.run("echo hello", &cancel).await;
    assert_eq!(output.as_deref(), Some("hello\n"));
    assert_eq!(session.state(), SessionState::Open);

    let output = session.run("printf 'a\\nb\\n'; echo c", &cancel).await;
    assert_eq!(output.as_deref(), Some("a\nb\nc\n"));

    session.close().await;
}

#[tokio::test]
async fn test_empty_output_is_not_a_failure() {
    let session = local_session();
    let output = session.run("true", &CancellationToken::new()).await;
    assert_eq!(output.as_deref(), Some(""));
    session.close().await;
}

#[tokio::test]
async fn test_open_is_idempotent() {
    let session = local_session();
    session.open().await.expect("sh spawns");
    session.open().await.expect("already open");
    assert!(session.is_alive());
    session.close().await;
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_concurrent_callers_get_their_own_output() {
    let session = Arc::new(local_session());
    let mut handles = Vec::new();
    for i in 0..12 {
        let session = Arc::clone(&session);
        handles.push(tokio::spawn(async move {
            let out = session
                .run(&format!("echo start-{i}; echo end-{i}"), &CancellationToken::new())
                .await;
            (i, out)
        }));
    }
    for handle in handles {
        let (i, out) = handle.await.expect("task joined");
        assert_eq!(out, Some(format!("start-{i}\nend-{i}\n")));
    }
    session.close().await;
}

#[tokio::test]
async fn test_dead_shell_is_restarted_on_next_call() {
    let session = local_session();
    let cancel = CancellationToken::new();

    assert!(session.run("exit 0", &cancel).await.is_none());
    assert_eq!(session.state(), SessionState::Dead);

    let output = session.run("echo back", &cancel).await;
    assert_eq!(output.as_deref(), Some("back\n"));
    assert_eq!(session.state(), SessionState::Open);
    session.close().await;
}

#[tokio::test]
async fn test_timeout_kills_and_restarts() {
    let session = local_session().with_command_timeout(Duration::from_millis(200));
    let cancel = CancellationToken::new();

    assert!(session.run("sleep 5; echo late", &cancel).await.is_none());
    assert_eq!(session.state(), SessionState::Dead);

    let output = session.run("echo fresh", &cancel).await;
    assert_eq!(output.as_deref(), Some("fresh\n"));
    session.close().await;
}

#[tokio::test]
async fn test_cancellation_keeps_session_and_drops_stale_output() {
    let session = Arc::new(local_session());
    let cancel = CancellationToken::new();

    let slow = {
        let session = Arc::clone(&session);
        let cancel = cancel.clone();
        tokio::spawn(async move { session.run("sleep 0.3; echo stale", &cancel).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    assert!(slow.await.expect("task joined").is_none());
    assert_eq!(session.state(), SessionState::Open);

    let output = session.run("echo next", &CancellationToken::new()).await;
    assert_eq!(output.as_deref(), Some("next\n"));
    session.close().await;
}

#[tokio::test]
async fn test_already_cancelled_token_short_circuits() {
    let session = local_session();
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(session.run("echo never", &cancel).await.is_none());
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_dispose_is_permanent() {
    let session = local_session();
    let cancel = CancellationToken::new();
    assert!(session.run("echo once", &cancel).await.is_some());

    session.dispose().await;
    assert!(session.is_disposed());
    assert!(session.run("echo again", &cancel).await.is_none());
    assert!(session.open().await.is_err());
}

#[tokio::test]
async fn test_marker_lookalikes_in_output_pass_through() {
    let session = local_session();
    let output = session
        .run("echo __DROIDMON_7f3a9c_0_END__", &CancellationToken::new())
        .await;
    assert_eq!(output.as_deref(), Some("__DROIDMON_7f3a9c_0_END__\n"));
    session.close().await;
}
