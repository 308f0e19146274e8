//! Human-readable rendering of telemetry.

use std::fmt::Write as _;
use std::time::Duration;

use droidmon_core::config::MonitoringSettings;
use droidmon_core::metrics::{DeviceInfo, SystemMetrics};
use droidmon_core::process::ProcessTable;

/// Placeholder for a figure that is not available yet
pub const UNAVAILABLE: &str = "-";

/// Formats a byte count with binary units
#[must_use]
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Formats a per-second byte rate
#[must_use]
pub fn human_rate(bytes_per_sec: Option<f64>) -> String {
    bytes_per_sec.map_or_else(
        || UNAVAILABLE.to_string(),
        |r| format!("{}/s", human_bytes(r.round() as u64)),
    )
}

/// Formats a percentage with one decimal
#[must_use]
pub fn percent(value: Option<f32>) -> String {
    value.map_or_else(|| UNAVAILABLE.to_string(), |v| format!("{v:.1}%"))
}

/// Formats an uptime as `2d 19h 02m`
#[must_use]
pub fn human_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3600;
    let minutes = (total % 3600) / 60;
    if days > 0 {
        format!("{days}d {hours}h {minutes:02}m")
    } else if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else {
        format!("{minutes}m {:02}s", total % 60)
    }
}

/// Renders a full snapshot, honouring the `show_*` toggles
#[must_use]
pub fn metrics_table(metrics: &SystemMetrics, show: &MonitoringSettings) -> String {
    let snapshot = &metrics.snapshot;
    let mut out = String::new();

    if show.show_cpu {
        let _ = writeln!(out, "CPU");
        let _ = writeln!(out, "  Usage:     {}", percent(metrics.cpu_percent));
        if let Some(split) = metrics.cpu_breakdown {
            let _ = writeln!(
                out,
                "  Split:     user {:.1}%  system {:.1}%  idle {:.1}%",
                split.user, split.system, split.idle
            );
        }
        for (label, pct) in &metrics.core_percents {
            let _ = writeln!(out, "  {label:<10} {}", percent(*pct));
        }
        let load = snapshot.load;
        let _ = writeln!(
            out,
            "  Load:      {:.2} {:.2} {:.2}",
            load.one, load.five, load.fifteen
        );
        let _ = writeln!(
            out,
            "  Tasks:     {} processes, {} threads",
            snapshot.process_count, snapshot.thread_count
        );
    }

    if show.show_memory {
        let mem = &snapshot.memory;
        let _ = writeln!(out, "Memory");
        let _ = writeln!(
            out,
            "  Used:      {} / {} ({:.1}%)",
            human_bytes(mem.used_bytes()),
            human_bytes(mem.total_bytes),
            mem.percent()
        );
        if mem.swap_total_bytes > 0 {
            let _ = writeln!(
                out,
                "  Swap:      {} / {} ({:.1}%)",
                human_bytes(mem.swap_used_bytes()),
                human_bytes(mem.swap_total_bytes),
                mem.swap_percent()
            );
        }
    }

    if show.show_disk {
        let disk = &snapshot.disk;
        let _ = writeln!(out, "Disk");
        let _ = writeln!(
            out,
            "  Read:      {}",
            human_rate(metrics.disk.read_bytes_per_sec)
        );
        let _ = writeln!(
            out,
            "  Write:     {}",
            human_rate(metrics.disk.write_bytes_per_sec)
        );
        if let Some(latency) = disk.latency_ms {
            let _ = writeln!(out, "  Latency:   {latency} ms");
        }
        if let Some(speed) = disk.recent_write_kib_per_sec {
            let _ = writeln!(out, "  Benchmark: {speed} KiB/s");
        }
    }

    if show.show_network {
        let _ = writeln!(out, "Network");
        let _ = writeln!(
            out,
            "  Receive:   {}",
            human_rate(metrics.network.rx_bytes_per_sec)
        );
        let _ = writeln!(
            out,
            "  Transmit:  {}",
            human_rate(metrics.network.tx_bytes_per_sec)
        );
    }

    if show.show_thermal {
        let thermal = &snapshot.thermal;
        let _ = writeln!(out, "Thermal");
        if thermal.zones.is_empty() {
            let _ = writeln!(out, "  {UNAVAILABLE}");
        }
        for zone in &thermal.zones {
            let _ = writeln!(out, "  {:<10} {:.1}°C", zone.name, zone.celsius);
        }
        if let Some(fan) = thermal.fan {
            let _ = writeln!(out, "  Fan:       {fan}");
        }
    }

    if let Some(uptime) = snapshot.uptime {
        let _ = writeln!(out, "Uptime:      {}", human_duration(uptime));
    }

    out.trim_end().to_string()
}

/// Renders one compact status line for streaming output
#[must_use]
pub fn metrics_line(metrics: &SystemMetrics) -> String {
    let snapshot = &metrics.snapshot;
    let hottest = snapshot
        .thermal
        .hottest()
        .map_or_else(|| UNAVAILABLE.to_string(), |z| format!("{:.1}°C", z.celsius));
    format!(
        "{}  cpu {:>6}  mem {:>5.1}%  rx {:>12}  tx {:>12}  temp {}",
        snapshot
            .timestamp
            .with_timezone(&chrono::Local)
            .format("%H:%M:%S"),
        percent(metrics.cpu_percent),
        snapshot.memory.percent(),
        human_rate(metrics.network.rx_bytes_per_sec),
        human_rate(metrics.network.tx_bytes_per_sec),
        hottest
    )
}

/// Renders device properties
#[must_use]
pub fn device_table(info: &DeviceInfo) -> String {
    let or_dash = |s: &str| {
        if s.is_empty() {
            UNAVAILABLE.to_string()
        } else {
            s.to_string()
        }
    };
    let mut out = String::new();
    let _ = writeln!(out, "Model:        {}", or_dash(&info.model));
    let _ = writeln!(out, "Manufacturer: {}", or_dash(&info.manufacturer));
    let _ = writeln!(
        out,
        "Android:      {} (SDK {})",
        or_dash(&info.android_version),
        info.sdk_level
            .map_or_else(|| UNAVAILABLE.to_string(), |s| s.to_string())
    );
    let _ = writeln!(out, "ABI:          {}", or_dash(&info.abi));
    let _ = writeln!(
        out,
        "Uptime:       {}",
        info.uptime
            .map_or_else(|| UNAVAILABLE.to_string(), human_duration)
    );
    out.trim_end().to_string()
}

/// Renders the top `limit` rows of a process table
#[must_use]
pub fn process_table(table: &ProcessTable, limit: usize, apps_only: bool) -> String {
    let rows: Vec<_> = table
        .rows
        .iter()
        .filter(|r| !apps_only || r.is_app)
        .take(limit)
        .collect();

    let mut out = String::new();
    let _ = writeln!(
        out,
        "System CPU {}  (processes {:.1}%)",
        percent(table.system_cpu_percent),
        table.process_cpu_sum
    );
    if rows.is_empty() {
        let _ = writeln!(out, "No processes found.");
        return out.trim_end().to_string();
    }

    let name_width = rows
        .iter()
        .map(|r| r.cmdline.len())
        .max()
        .unwrap_or(4)
        .clamp(4, 48);
    let _ = writeln!(
        out,
        "{:>7}  {:>6}  {:>6}  {:>10}  {:1}  {:<name_width$}",
        "PID", "UID", "CPU", "RSS", "S", "NAME"
    );
    for row in rows {
        let name: String = row.cmdline.chars().take(name_width).collect();
        let _ = writeln!(
            out,
            "{:>7}  {:>6}  {:>5.1}%  {:>10}  {:1}  {:<name_width$}",
            row.pid,
            row.uid,
            row.cpu_percent,
            human_bytes(row.rss_bytes),
            row.state,
            name
        );
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use droidmon_core::process::{ProcessRow, ProcessState};

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(1536), "1.5 KiB");
        assert_eq!(human_bytes(5 * 1024 * 1024 * 1024), "5.0 GiB");
    }

    #[test]
    fn test_rates_and_percentages_show_placeholder() {
        assert_eq!(human_rate(None), UNAVAILABLE);
        assert_eq!(human_rate(Some(2048.0)), "2.0 KiB/s");
        assert_eq!(percent(None), UNAVAILABLE);
        assert_eq!(percent(Some(58.333)), "58.3%");
    }

    #[test]
    fn test_human_duration() {
        assert_eq!(human_duration(Duration::from_secs(42)), "0m 42s");
        assert_eq!(human_duration(Duration::from_secs(3 * 3600 + 5 * 60)), "3h 05m");
        assert_eq!(
            human_duration(Duration::from_secs(2 * 86_400 + 19 * 3600 + 2 * 60)),
            "2d 19h 02m"
        );
    }

    fn row(pid: u32, uid: u32, cpu: f32) -> ProcessRow {
        ProcessRow {
            pid,
            name: format!("p{pid}"),
            cmdline: format!("com.example.p{pid}"),
            uid,
            is_app: uid >= 10_000,
            state: ProcessState::Sleeping,
            cpu_percent: cpu,
            rss_bytes: 4096,
        }
    }

    #[test]
    fn test_process_table_filters_and_limits() {
        let table = ProcessTable {
            rows: vec![row(100, 10_123, 20.0), row(200, 1000, 10.0), row(300, 10_200, 5.0)],
            system_cpu_percent: Some(42.0),
            process_cpu_sum: 35.0,
        };
        let text = process_table(&table, 1, true);
        assert!(text.contains("42.0%"));
        assert!(text.contains("com.example.p100"));
        assert!(!text.contains("com.example.p300"));
        assert!(!text.contains("com.example.p200"));

        let text = process_table(&table, 10, true);
        assert!(text.contains("com.example.p300"));
        assert!(!text.contains("com.example.p200"));
    }

    #[test]
    fn test_empty_device_info_uses_placeholders() {
        let text = device_table(&DeviceInfo::default());
        assert!(text.contains("Model:        -"));
        assert!(text.contains("SDK -"));
    }
}
