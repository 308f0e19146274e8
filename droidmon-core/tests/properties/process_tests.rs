//! Property-based tests for process reconciliation
//!
//! Per-process CPU is never negative and never attributed to a process
//! without a baseline; identical snapshots produce an all-zero table.

use droidmon_core::process::{
    ProcessSnapshot, ProcessState, ProcessTracker, RawProcessEntry, reconcile,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Strategy for one process entry
fn arb_entry() -> impl Strategy<Value = RawProcessEntry> {
    (1u32..5000, 0u64..1_000_000, 0u64..100_000, 0u32..20_000).prop_map(
        |(pid, jiffies, rss_pages, uid)| RawProcessEntry {
            pid,
            jiffies,
            name: format!("proc{pid}"),
            rss_pages,
            uid,
            cmdline: format!("/system/bin/proc{pid}"),
            state: ProcessState::Sleeping,
        },
    )
}

/// Strategy for a whole snapshot
fn arb_snapshot() -> impl Strategy<Value = ProcessSnapshot> {
    (
        prop::collection::vec(arb_entry(), 0..40),
        0u64..10_000_000,
        0u64..10_000_000,
    )
        .prop_map(|(entries, total, idle)| ProcessSnapshot {
            processes: entries
                .into_iter()
                .map(|e| (e.pid, e))
                .collect::<BTreeMap<_, _>>(),
            total_jiffies: total.max(idle),
            idle_jiffies: idle.min(total),
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// No row is ever negative, and bookkeeping PIDs are hidden
    #[test]
    fn prop_rows_non_negative(prev in arb_snapshot(), curr in arb_snapshot()) {
        let table = reconcile(Some(&prev), &curr);
        prop_assert!(table.rows.iter().all(|r| r.cpu_percent >= 0.0));
        prop_assert!(table.rows.iter().all(|r| r.pid > 2));
        prop_assert!(table.process_cpu_sum >= 0.0);
        if let Some(system) = table.system_cpu_percent {
            prop_assert!((0.0..=100.0).contains(&system));
        }
    }

    /// Reconciling a snapshot against itself yields zero everywhere
    #[test]
    fn prop_identical_snapshots_are_idle(snapshot in arb_snapshot()) {
        let table = reconcile(Some(&snapshot), &snapshot);
        prop_assert!(table.rows.iter().all(|r| r.cpu_percent == 0.0));
        prop_assert!(table.system_cpu_percent.is_none());
    }

    /// Without a baseline every row is 0%
    #[test]
    fn prop_first_poll_is_zero(snapshot in arb_snapshot()) {
        let table = reconcile(None, &snapshot);
        prop_assert!(table.rows.iter().all(|r| r.cpu_percent == 0.0));
        prop_assert!(table.system_cpu_percent.is_none());
    }

    /// Rows are sorted by CPU descending, ties by PID ascending
    #[test]
    fn prop_rows_sorted(prev in arb_snapshot(), curr in arb_snapshot()) {
        let table = reconcile(Some(&prev), &curr);
        for pair in table.rows.windows(2) {
            prop_assert!(
                pair[0].cpu_percent > pair[1].cpu_percent
                    || (pair[0].cpu_percent == pair[1].cpu_percent && pair[0].pid < pair[1].pid)
            );
        }
    }

    /// Memory and app classification follow from the raw entry
    #[test]
    fn prop_row_fields_derived(snapshot in arb_snapshot()) {
        let table = reconcile(None, &snapshot);
        for row in &table.rows {
            let raw = &snapshot.processes[&row.pid];
            prop_assert_eq!(row.rss_bytes, raw.rss_pages * 4096);
            prop_assert_eq!(row.is_app, raw.uid >= 10_000);
        }
    }

    /// An empty read never replaces the baseline
    #[test]
    fn prop_tracker_ignores_empty_reads(snapshot in arb_snapshot()) {
        prop_assume!(!snapshot.is_empty() && snapshot.total_jiffies > 0);
        let mut tracker = ProcessTracker::new();
        prop_assert!(tracker.update(snapshot).is_some());
        prop_assert!(tracker.update(ProcessSnapshot::default()).is_none());
        prop_assert!(tracker.has_baseline());
    }
}
