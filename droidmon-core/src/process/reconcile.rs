use serde::{Deserialize, Serialize};

use super::parser::{ProcessSnapshot, ProcessState, RawProcessEntry};
use crate::diff::busy_percent;
use crate::tracing::span_names;

/// UIDs at or above this belong to installed applications
pub const APP_UID_THRESHOLD: u32 = 10_000;

/// Bytes per RSS page
pub const PAGE_SIZE_BYTES: u64 = 4096;

/// Highest PID excluded from the table (`0`, `init` and `kthreadd`)
const MAX_HIDDEN_PID: u32 = 2;

/// One row of the process table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRow {
    /// Process id
    pub pid: u32,
    /// Kernel-truncated command name
    pub name: String,
    /// First argument of the command line
    pub cmdline: String,
    /// Owning UID
    pub uid: u32,
    /// Whether the UID belongs to an installed app
    pub is_app: bool,
    /// Scheduler state
    pub state: ProcessState,
    /// Share of all CPU time over the last window, 0 for new PIDs
    pub cpu_percent: f32,
    /// Resident memory
    pub rss_bytes: u64,
}

impl ProcessRow {
    fn from_entry(entry: &RawProcessEntry, cpu_percent: f32) -> Self {
        Self {
            pid: entry.pid,
            name: entry.name.clone(),
            cmdline: entry.cmdline.clone(),
            uid: entry.uid,
            is_app: entry.uid >= APP_UID_THRESHOLD,
            state: entry.state,
            cpu_percent,
            rss_bytes: entry.rss_pages.saturating_mul(PAGE_SIZE_BYTES),
        }
    }
}

/// The reconciled table for one poll
///
/// `system_cpu_percent` comes from the aggregate jiffies and includes time
/// not billed to any process (interrupts, I/O wait, kernel work), so it is
/// usually larger than `process_cpu_sum`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessTable {
    /// Rows sorted by CPU descending, then PID
    pub rows: Vec<ProcessRow>,
    /// Whole-device CPU usage, `None` without a previous snapshot
    pub system_cpu_percent: Option<f32>,
    /// Sum of the per-row CPU percentages
    pub process_cpu_sum: f32,
}

/// Reconciles two snapshots into a table
///
/// PIDs only in `curr` get 0% (no baseline yet); PIDs only in `prev` are
/// dropped. A tick count that did not grow (including PID reuse) yields 0%.
#[must_use]
pub fn reconcile(prev: Option<&ProcessSnapshot>, curr: &ProcessSnapshot) -> ProcessTable {
    let span = tracing::debug_span!(
        span_names::PROCESS_RECONCILE,
        process_count = curr.processes.len()
    );
    let _entered = span.enter();

    let delta_total = prev.map_or(0, |p| curr.total_jiffies.saturating_sub(p.total_jiffies));

    let mut rows: Vec<ProcessRow> = curr
        .processes
        .values()
        .filter(|entry| entry.pid > MAX_HIDDEN_PID)
        .map(|entry| {
            let cpu = prev
                .and_then(|p| p.processes.get(&entry.pid))
                .map_or(0.0, |before| {
                    process_percent(before.jiffies, entry.jiffies, delta_total)
                });
            ProcessRow::from_entry(entry, cpu)
        })
        .collect();

    rows.sort_by(|a, b| {
        b.cpu_percent
            .total_cmp(&a.cpu_percent)
            .then(a.pid.cmp(&b.pid))
    });

    let system_cpu_percent = prev.and_then(|p| {
        busy_percent(
            p.total_jiffies.saturating_sub(p.idle_jiffies),
            p.total_jiffies,
            curr.total_jiffies.saturating_sub(curr.idle_jiffies),
            curr.total_jiffies,
        )
    });
    let process_cpu_sum = rows.iter().map(|r| r.cpu_percent).sum();

    ProcessTable {
        rows,
        system_cpu_percent,
        process_cpu_sum,
    }
}

fn process_percent(prev_ticks: u64, curr_ticks: u64, delta_total: u64) -> f32 {
    if delta_total == 0 || curr_ticks <= prev_ticks {
        return 0.0;
    }
    ((curr_ticks - prev_ticks) as f64 / delta_total as f64 * 100.0) as f32
}

/// Keeps the previous snapshot between polls
#[derive(Debug, Default)]
pub struct ProcessTracker {
    previous: Option<ProcessSnapshot>,
}

impl ProcessTracker {
    /// Creates a tracker with no baseline
    #[must_use]
    pub const fn new() -> Self {
        Self { previous: None }
    }

    /// Reconciles `snapshot` against the previous one and keeps it as the
    /// new baseline.
    ///
    /// An empty snapshot, or one without the `/proc/stat` totals, is a bad
    /// read: it is discarded, the baseline is kept, and `None` is returned.
    pub fn update(&mut self, snapshot: ProcessSnapshot) -> Option<ProcessTable> {
        if snapshot.is_empty() {
            tracing::warn!("Process snapshot was empty, discarding cycle");
            return None;
        }
        if snapshot.total_jiffies == 0 {
            tracing::warn!(
                process_count = snapshot.len(),
                "Process snapshot has no CPU totals, discarding cycle"
            );
            return None;
        }
        let table = reconcile(self.previous.as_ref(), &snapshot);
        self.previous = Some(snapshot);
        Some(table)
    }

    /// Whether a baseline exists
    #[must_use]
    pub const fn has_baseline(&self) -> bool {
        self.previous.is_some()
    }

    /// Drops the baseline, e.g. after reconnecting to a device
    pub fn reset(&mut self) {
        self.previous = None;
    }
}
