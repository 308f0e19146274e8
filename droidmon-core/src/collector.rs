//! Poll loop
//!
//! [`start_collector`] spawns a task that reads device info once, then on
//! every tick polls system telemetry (and the process table when enabled)
//! and emits [`MetricsEvent`]s. Transport failures skip the tick; the loop
//! ends on [`CollectorHandle::stop`], or when the handle or the receiver is
//! dropped.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::Instrument;

use crate::adb::CancellationToken;
use crate::config::MonitoringSettings;
use crate::diff::derive_metrics;
use crate::metrics::{DeviceInfo, SystemMetrics, SystemSnapshot};
use crate::process::{ProcessTable, ProcessTracker};
use crate::telemetry::Telemetry;
use crate::tracing::span_names;

/// Capacity of the event channel
const EVENT_BUFFER: usize = 8;

/// Events emitted by the poll loop
#[derive(Debug, Clone)]
pub enum MetricsEvent {
    /// Static device properties, read once at start
    DeviceInfoReady(DeviceInfo),
    /// A system snapshot with derived rates
    Update(Box<SystemMetrics>),
    /// A reconciled process table
    Processes(ProcessTable),
    /// The loop has ended
    Stopped,
}

/// Turns consecutive system snapshots into [`SystemMetrics`]
#[derive(Debug, Default)]
pub struct MetricsComputer {
    previous: Option<SystemSnapshot>,
}

impl MetricsComputer {
    /// Creates a computer with no baseline
    #[must_use]
    pub const fn new() -> Self {
        Self { previous: None }
    }

    /// Derives figures against the previous snapshot and keeps `snapshot`
    /// as the new baseline. The first call has no derived figures.
    pub fn compute(&mut self, snapshot: SystemSnapshot) -> SystemMetrics {
        let metrics = derive_metrics(self.previous.as_ref(), snapshot);
        self.previous = Some(metrics.snapshot.clone());
        metrics
    }

    /// Drops the baseline, e.g. on reconnect
    pub fn reset(&mut self) {
        self.previous = None;
    }
}

/// Controls a running collector
#[derive(Debug)]
pub struct CollectorHandle {
    stop_tx: mpsc::Sender<()>,
    interval_tx: watch::Sender<Duration>,
    cancel: CancellationToken,
}

impl CollectorHandle {
    /// Stops the loop, abandoning any in-flight poll
    pub async fn stop(&self) {
        self.cancel.cancel();
        let _ = self.stop_tx.send(()).await;
    }

    /// Changes the cadence; clamped to 1–30 seconds. The ticker restarts,
    /// so the next poll happens one new interval from now.
    pub fn set_interval(&self, secs: u8) {
        let settings = MonitoringSettings {
            interval_secs: secs,
            ..MonitoringSettings::default()
        };
        let interval = Duration::from_secs(u64::from(settings.effective_interval_secs()));
        let _ = self.interval_tx.send(interval);
    }

    /// The current cadence
    #[must_use]
    pub fn interval(&self) -> Duration {
        *self.interval_tx.borrow()
    }
}

fn new_ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Starts the poll loop on the current tokio runtime
///
/// Returns a handle to stop or retune the loop and a receiver for events.
#[must_use]
pub fn start_collector(
    settings: &MonitoringSettings,
    telemetry: Telemetry,
) -> (CollectorHandle, mpsc::Receiver<MetricsEvent>) {
    let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
    let (event_tx, event_rx) = mpsc::channel::<MetricsEvent>(EVENT_BUFFER);
    let initial = Duration::from_secs(u64::from(settings.effective_interval_secs()));
    let (interval_tx, mut interval_rx) = watch::channel(initial);
    let cancel = CancellationToken::new();
    let processes_enabled = settings.processes_enabled;

    let loop_cancel = cancel.clone();
    tokio::spawn(async move {
        let cancel = loop_cancel;
        let mut computer = MetricsComputer::new();
        let mut tracker = ProcessTracker::new();
        let mut ticker = new_ticker(initial);
        let mut device_info_sent = false;
        let mut tick: u64 = 0;

        loop {
            tokio::select! {
                _ = stop_rx.recv() => break,
                changed = interval_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let period = *interval_rx.borrow_and_update();
                    tracing::debug!(interval_secs = period.as_secs(), "Poll interval changed");
                    ticker = new_ticker(period);
                }
                _ = ticker.tick() => {
                    tick += 1;
                    let span = tracing::debug_span!(span_names::COLLECTOR_TICK, tick);
                    let keep_going = poll_once(
                        &telemetry,
                        &cancel,
                        &event_tx,
                        &mut computer,
                        &mut tracker,
                        processes_enabled,
                        &mut device_info_sent,
                    )
                    .instrument(span)
                    .await;
                    if !keep_going {
                        break;
                    }
                }
            }
        }

        let _ = event_tx.send(MetricsEvent::Stopped).await;
        tracing::debug!("Collector stopped");
    });

    (
        CollectorHandle {
            stop_tx,
            interval_tx,
            cancel,
        },
        event_rx,
    )
}

/// One tick. Returns false once the receiver is gone or the loop was
/// cancelled.
async fn poll_once(
    telemetry: &Telemetry,
    cancel: &CancellationToken,
    events: &mpsc::Sender<MetricsEvent>,
    computer: &mut MetricsComputer,
    tracker: &mut ProcessTracker,
    processes_enabled: bool,
    device_info_sent: &mut bool,
) -> bool {
    if !*device_info_sent {
        if let Some(info) = telemetry.device_info(cancel).await {
            *device_info_sent = true;
            if events.send(MetricsEvent::DeviceInfoReady(info)).await.is_err() {
                return false;
            }
        } else {
            tracing::debug!("Device info unavailable, retrying next tick");
        }
    }

    match telemetry.poll_system(cancel).await {
        Some(snapshot) => {
            let metrics = computer.compute(snapshot);
            if events.send(MetricsEvent::Update(Box::new(metrics))).await.is_err() {
                return false;
            }
        }
        None => tracing::debug!("System poll failed, skipping tick"),
    }

    if processes_enabled
        && let Some(snapshot) = telemetry.poll_processes(cancel).await
        && let Some(table) = tracker.update(snapshot)
        && events.send(MetricsEvent::Processes(table)).await.is_err()
    {
        return false;
    }

    !cancel.is_cancelled()
}
