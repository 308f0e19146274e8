//! Integration tests for the telemetry pipeline
//!
//! Linux exposes the same `/proc` files an Android device does, so a local
//! shell session exercises batching, demultiplexing, parsing and
//! differencing end to end. Android-only commands (`dumpsys`, `getprop`)
//! fail quietly and their sections fall back to defaults.

use droidmon_core::adb::{
    CancellationToken, OneOffRunner, OneOffShell, RemoteShellSession, ShellLauncher,
    ShellTransport,
};
use droidmon_core::client::DeviceClient;
use droidmon_core::collector::MetricsComputer;
use droidmon_core::process::ProcessTracker;
use droidmon_core::telemetry::Telemetry;
use std::sync::Arc;
use std::time::Duration;

fn local_client() -> Arc<DeviceClient> {
    let session = RemoteShellSession::new(ShellLauncher::new("sh", Vec::new()));
    let fallback = OneOffShell::new(OneOffRunner::new("sh", Vec::new()), vec!["-c".to_string()]);
    Arc::new(DeviceClient::with_transports(
        Some(Arc::new(session)),
        Arc::new(fallback) as Arc<dyn ShellTransport>,
        OneOffRunner::new("sh", Vec::new()),
    ))
}

#[tokio::test]
async fn test_system_poll_against_local_proc() {
    let client = local_client();
    let telemetry = Telemetry::new(Arc::clone(&client)).expect("built-in batches");
    let cancel = CancellationToken::new();

    let snapshot = telemetry.poll_system(&cancel).await.expect("local shell");
    assert!(snapshot.memory.total_bytes > 0);
    assert!(snapshot.memory.used_bytes() <= snapshot.memory.total_bytes);
    assert!(snapshot.cpu.aggregate.total() > 0);
    assert!(!snapshot.cpu.cores.is_empty());
    assert!(snapshot.process_count > 0);
    assert!(snapshot.thermal.zones.is_empty());

    client.close().await;
}

#[tokio::test]
async fn test_two_polls_produce_bounded_cpu() {
    let client = local_client();
    let telemetry = Telemetry::new(Arc::clone(&client)).expect("built-in batches");
    let cancel = CancellationToken::new();
    let mut computer = MetricsComputer::new();

    let first = telemetry.poll_system(&cancel).await.expect("first poll");
    assert!(computer.compute(first).cpu_percent.is_none());

    tokio::time::sleep(Duration::from_millis(300)).await;
    let second = telemetry.poll_system(&cancel).await.expect("second poll");
    let metrics = computer.compute(second);
    if let Some(pct) = metrics.cpu_percent {
        assert!((0.0..=100.0).contains(&pct));
    }
    if let Some(rx) = metrics.network.rx_bytes_per_sec {
        assert!(rx >= 0.0);
    }

    client.close().await;
}

#[tokio::test]
async fn test_process_poll_reconciles() {
    let client = local_client();
    let telemetry = Telemetry::new(Arc::clone(&client)).expect("built-in batches");
    let cancel = CancellationToken::new();
    let mut tracker = ProcessTracker::new();

    let first = telemetry.poll_processes(&cancel).await.expect("first poll");
    assert!(!first.is_empty());
    assert!(first.total_jiffies > 0);
    let table = tracker.update(first).expect("non-empty snapshot");
    assert!(table.system_cpu_percent.is_none());
    assert!(table.rows.iter().all(|r| r.cpu_percent == 0.0));
    assert!(table.rows.iter().all(|r| r.pid > 2));

    tokio::time::sleep(Duration::from_millis(200)).await;
    let second = telemetry.poll_processes(&cancel).await.expect("second poll");
    let table = tracker.update(second).expect("non-empty snapshot");
    assert!(table.rows.iter().all(|r| r.cpu_percent >= 0.0));
    assert!(
        table
            .rows
            .windows(2)
            .all(|w| w[0].cpu_percent >= w[1].cpu_percent)
    );

    client.close().await;
}

#[tokio::test]
async fn test_disposed_session_falls_back_to_one_off() {
    let client = local_client();
    client.dispose().await;

    let output = client
        .run_shell("echo via-fallback", &CancellationToken::new())
        .await;
    assert_eq!(output.as_deref(), Some("via-fallback\n"));
}
