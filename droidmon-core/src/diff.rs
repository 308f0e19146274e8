//! Differencing engine
//!
//! Pure functions of two snapshots. A figure is only produced when every
//! counter it depends on has not gone backwards and time has advanced;
//! otherwise the result is `None` and the caller re-baselines on the next
//! poll. No result is ever negative.

use std::collections::BTreeMap;

use crate::metrics::{
    CoreJiffies, CpuBreakdown, CpuSnapshot, CpuTimes, DiskRates, DiskSnapshot, NetworkRates,
    NetworkSnapshot, SystemMetrics, SystemSnapshot,
};

/// Per-second rate of a monotonic counter
///
/// Returns `None` when the counter regressed or `elapsed_secs` is not a
/// positive finite number.
#[must_use]
pub fn rate(prev: u64, curr: u64, elapsed_secs: f64) -> Option<f64> {
    if curr < prev || !elapsed_secs.is_finite() || elapsed_secs <= 0.0 {
        return None;
    }
    Some((curr - prev) as f64 / elapsed_secs)
}

/// `100 * Δactive / Δtotal` for one jiffy window
///
/// `None` if total did not advance or active/idle regressed.
#[must_use]
pub fn busy_percent(
    prev_active: u64,
    prev_total: u64,
    curr_active: u64,
    curr_total: u64,
) -> Option<f32> {
    if curr_total <= prev_total || curr_active < prev_active {
        return None;
    }
    let prev_idle = prev_total.saturating_sub(prev_active);
    let curr_idle = curr_total.saturating_sub(curr_active);
    if curr_idle < prev_idle {
        return None;
    }
    let d_total = (curr_total - prev_total) as f64;
    let d_active = (curr_active - prev_active) as f64;
    Some(((d_active / d_total) * 100.0).clamp(0.0, 100.0) as f32)
}

/// Aggregate CPU usage between two readings
#[must_use]
pub fn cpu_percent(prev: &CpuTimes, curr: &CpuTimes) -> Option<f32> {
    busy_percent(prev.active(), prev.total(), curr.active(), curr.total())
}

/// User/system/idle split between two readings; the three parts sum to 100
#[must_use]
pub fn cpu_breakdown(prev: &CpuTimes, curr: &CpuTimes) -> Option<CpuBreakdown> {
    let d_user = curr.user_total().checked_sub(prev.user_total())?;
    let d_system = curr.system_total().checked_sub(prev.system_total())?;
    let d_idle = curr.idle.checked_sub(prev.idle)?;
    let d_total = d_user + d_system + d_idle;
    if d_total == 0 {
        return None;
    }
    let pct = |d: u64| ((d as f64 / d_total as f64) * 100.0) as f32;
    Some(CpuBreakdown {
        user: pct(d_user),
        system: pct(d_system),
        idle: pct(d_idle),
    })
}

/// Usage of one core between two readings
#[must_use]
pub fn core_percent(prev: &CoreJiffies, curr: &CoreJiffies) -> Option<f32> {
    busy_percent(prev.active, prev.total, curr.active, curr.total)
}

/// Per-core usage keyed by label
///
/// Every core in `curr` gets an entry; a core with no previous reading
/// (newly online) maps to `None`.
#[must_use]
pub fn core_percentages(
    prev: &CpuSnapshot,
    curr: &CpuSnapshot,
) -> BTreeMap<String, Option<f32>> {
    curr.cores
        .iter()
        .map(|core| {
            let pct = prev
                .cores
                .iter()
                .find(|p| p.label == core.label)
                .and_then(|p| core_percent(p, core));
            (core.label.clone(), pct)
        })
        .collect()
}

/// Network throughput between two readings
#[must_use]
pub fn network_rates(
    prev: &NetworkSnapshot,
    curr: &NetworkSnapshot,
    elapsed_secs: f64,
) -> NetworkRates {
    NetworkRates {
        rx_bytes_per_sec: rate(prev.rx_bytes, curr.rx_bytes, elapsed_secs),
        tx_bytes_per_sec: rate(prev.tx_bytes, curr.tx_bytes, elapsed_secs),
        rx_packets_per_sec: rate(prev.rx_packets, curr.rx_packets, elapsed_secs),
        tx_packets_per_sec: rate(prev.tx_packets, curr.tx_packets, elapsed_secs),
    }
}

/// Paging throughput between two readings
#[must_use]
pub fn disk_rates(prev: &DiskSnapshot, curr: &DiskSnapshot, elapsed_secs: f64) -> DiskRates {
    DiskRates {
        read_bytes_per_sec: rate(prev.paged_in_bytes, curr.paged_in_bytes, elapsed_secs),
        write_bytes_per_sec: rate(prev.paged_out_bytes, curr.paged_out_bytes, elapsed_secs),
    }
}

/// Seconds between two snapshots on the monotonic clock; negative when
/// `curr` was taken before `prev`
///
/// The wall-clock `timestamp` is display-only, so NTP steps between polls
/// do not skew rates.
#[must_use]
pub fn elapsed_secs(prev: &SystemSnapshot, curr: &SystemSnapshot) -> f64 {
    match curr.taken_at.checked_duration_since(prev.taken_at) {
        Some(elapsed) => elapsed.as_secs_f64(),
        None => -prev.taken_at.duration_since(curr.taken_at).as_secs_f64(),
    }
}

/// Annotates `curr` with every derived figure
///
/// With no `prev` (first poll) every derived figure is `None`.
#[must_use]
pub fn derive_metrics(prev: Option<&SystemSnapshot>, curr: SystemSnapshot) -> SystemMetrics {
    let Some(prev) = prev else {
        let core_percents = curr
            .cpu
            .cores
            .iter()
            .map(|c| (c.label.clone(), None))
            .collect();
        return SystemMetrics {
            snapshot: curr,
            cpu_percent: None,
            cpu_breakdown: None,
            core_percents,
            network: NetworkRates::default(),
            disk: DiskRates::default(),
        };
    };

    let elapsed = elapsed_secs(prev, &curr);
    let cpu_percent = cpu_percent(&prev.cpu.aggregate, &curr.cpu.aggregate);
    if cpu_percent.is_none() && curr.cpu.aggregate.total() < prev.cpu.aggregate.total() {
        tracing::warn!("CPU counters went backwards, re-baselining");
    }

    SystemMetrics {
        cpu_percent,
        cpu_breakdown: cpu_breakdown(&prev.cpu.aggregate, &curr.cpu.aggregate),
        core_percents: core_percentages(&prev.cpu, &curr.cpu),
        network: network_rates(&prev.network, &curr.network, elapsed),
        disk: disk_rates(&prev.disk, &curr.disk, elapsed),
        snapshot: curr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{LoadAverage, MemorySnapshot, ThermalSnapshot};
    use chrono::{TimeDelta, Utc};
    use std::time::{Duration, Instant};

    fn times(fields: &[u64]) -> CpuTimes {
        CpuTimes::from_fields(fields)
    }

    fn snapshot(cpu: &[u64], rx: u64, pgpgin: u64) -> SystemSnapshot {
        SystemSnapshot {
            cpu: CpuSnapshot {
                aggregate: times(cpu),
                cores: vec![CoreJiffies {
                    label: "cpu0".into(),
                    active: times(cpu).active(),
                    total: times(cpu).total(),
                }],
            },
            memory: MemorySnapshot::default(),
            disk: DiskSnapshot {
                paged_in_bytes: pgpgin,
                ..DiskSnapshot::default()
            },
            network: NetworkSnapshot {
                rx_bytes: rx,
                ..NetworkSnapshot::default()
            },
            thermal: ThermalSnapshot::default(),
            load: LoadAverage::default(),
            process_count: 0,
            thread_count: 0,
            uptime: None,
            timestamp: Utc::now(),
            taken_at: Instant::now(),
        }
    }

    #[test]
    fn test_cpu_percent_window() {
        let prev = times(&[100, 0, 50, 800, 10, 0, 0, 0]);
        let curr = times(&[150, 0, 70, 850, 10, 0, 0, 0]);
        let pct = cpu_percent(&prev, &curr).expect("advanced counters");
        assert!((pct - 58.333).abs() < 0.01);
    }

    #[test]
    fn test_cpu_percent_no_progress() {
        let t = times(&[100, 0, 50, 800, 10, 0, 0, 0]);
        assert!(cpu_percent(&t, &t).is_none());
    }

    #[test]
    fn test_cpu_percent_regression() {
        let prev = times(&[1000, 0, 500, 8000, 0, 0, 0, 0]);
        let curr = times(&[10, 0, 5, 80, 0, 0, 0, 0]);
        assert!(cpu_percent(&prev, &curr).is_none());
        assert!(cpu_breakdown(&prev, &curr).is_none());
    }

    #[test]
    fn test_breakdown_sums_to_hundred() {
        let prev = times(&[100, 10, 50, 800, 10, 1, 1, 0]);
        let curr = times(&[160, 20, 80, 900, 20, 2, 3, 0]);
        let b = cpu_breakdown(&prev, &curr).expect("advanced counters");
        assert!((b.user + b.system + b.idle - 100.0).abs() < 0.01);
        let busy = cpu_percent(&prev, &curr).expect("advanced counters");
        assert!((b.user + b.system - busy).abs() < 0.01);
    }

    #[test]
    fn test_rate_rules() {
        assert_eq!(rate(100, 300, 2.0), Some(100.0));
        assert_eq!(rate(100, 100, 2.0), Some(0.0));
        assert_eq!(rate(300, 100, 2.0), None);
        assert_eq!(rate(100, 300, 0.0), None);
        assert_eq!(rate(100, 300, -1.0), None);
        assert_eq!(rate(100, 300, f64::NAN), None);
    }

    #[test]
    fn test_core_percentages_by_label() {
        let prev = CpuSnapshot {
            aggregate: CpuTimes::default(),
            cores: vec![CoreJiffies {
                label: "cpu0".into(),
                active: 100,
                total: 200,
            }],
        };
        let curr = CpuSnapshot {
            aggregate: CpuTimes::default(),
            cores: vec![
                CoreJiffies {
                    label: "cpu0".into(),
                    active: 150,
                    total: 300,
                },
                CoreJiffies {
                    label: "cpu1".into(),
                    active: 10,
                    total: 20,
                },
            ],
        };
        let map = core_percentages(&prev, &curr);
        assert_eq!(map.get("cpu0").copied().flatten(), Some(50.0));
        assert_eq!(map.get("cpu1").copied(), Some(None));
    }

    #[test]
    fn test_derive_first_poll_has_no_data() {
        let m = derive_metrics(None, snapshot(&[1, 0, 1, 10, 0, 0, 0, 0], 5, 5));
        assert!(m.cpu_percent.is_none());
        assert!(m.cpu_breakdown.is_none());
        assert_eq!(m.core_percents.get("cpu0").copied(), Some(None));
        assert!(m.network.rx_bytes_per_sec.is_none());
        assert!(m.disk.read_bytes_per_sec.is_none());
    }

    #[test]
    fn test_derive_second_poll() {
        let prev = snapshot(&[100, 0, 50, 800, 10, 0, 0, 0], 1000, 4096);
        let mut curr = snapshot(&[150, 0, 70, 850, 10, 0, 0, 0], 3000, 8192);
        curr.taken_at = prev.taken_at + Duration::from_secs(2);
        let m = derive_metrics(Some(&prev), curr);
        assert!((m.cpu_percent.unwrap_or_default() - 58.333).abs() < 0.01);
        assert_eq!(m.network.rx_bytes_per_sec, Some(1000.0));
        assert_eq!(m.disk.read_bytes_per_sec, Some(2048.0));
        assert!(m.core_percents["cpu0"].is_some());
    }

    #[test]
    fn test_wall_clock_jump_does_not_skew_rates() {
        let prev = snapshot(&[100, 0, 50, 800, 10, 0, 0, 0], 1000, 4096);
        let mut curr = snapshot(&[150, 0, 70, 850, 10, 0, 0, 0], 3000, 8192);
        curr.taken_at = prev.taken_at + Duration::from_secs(2);
        curr.timestamp = prev.timestamp + TimeDelta::hours(1);
        let m = derive_metrics(Some(&prev), curr);
        assert_eq!(m.network.rx_bytes_per_sec, Some(1000.0));
        assert_eq!(m.disk.read_bytes_per_sec, Some(2048.0));

        let mut curr = snapshot(&[150, 0, 70, 850, 10, 0, 0, 0], 3000, 8192);
        curr.taken_at = prev.taken_at + Duration::from_secs(2);
        curr.timestamp = prev.timestamp - TimeDelta::hours(1);
        let m = derive_metrics(Some(&prev), curr);
        assert_eq!(m.network.rx_bytes_per_sec, Some(1000.0));
    }

    #[test]
    fn test_derive_misordered_snapshots() {
        let prev = snapshot(&[100, 0, 50, 800, 10, 0, 0, 0], 1000, 0);
        let mut curr = snapshot(&[150, 0, 70, 850, 10, 0, 0, 0], 3000, 0);
        curr.taken_at = prev
            .taken_at
            .checked_sub(Duration::from_secs(1))
            .expect("monotonic clock is past one second");
        assert!(elapsed_secs(&prev, &curr) < 0.0);
        let m = derive_metrics(Some(&prev), curr);
        assert!(m.network.rx_bytes_per_sec.is_none());
        assert!(m.cpu_percent.is_some());
    }
}
