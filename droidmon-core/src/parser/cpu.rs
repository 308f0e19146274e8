//! `/proc/stat` + `/proc/loadavg` + `ls /proc/`
//!
//! The three outputs arrive concatenated in one section. Stat lines come
//! first, then the single loadavg line, then the directory listing.

use std::sync::LazyLock;

use regex::Regex;

use crate::metrics::{CoreJiffies, CpuSnapshot, CpuTimes, LoadAverage};

/// Matches a `/proc/loadavg` line: `0.52 0.34 0.28 3/1234 56789`
static LOADAVG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\d+(?:\.\d+)?\s+\d+(?:\.\d+)?\s+\d+(?:\.\d+)?\s+\d+/\d+\s+\d+\s*$")
        .expect("LOADAVG_LINE is a valid regex pattern")
});

/// Everything recovered from the CPU section
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CpuReport {
    /// Aggregate and per-core jiffies
    pub cpu: CpuSnapshot,
    /// Load averages
    pub load: LoadAverage,
    /// Purely numeric entries in the `/proc` listing
    pub process_count: u32,
    /// Denominator of the loadavg `running/total` field
    pub thread_count: u32,
}

/// Parses the combined CPU section
#[must_use]
pub fn parse_cpu_report(text: &str) -> CpuReport {
    let mut report = CpuReport::default();
    let mut in_listing = false;

    for line in text.lines() {
        if in_listing {
            report.process_count += count_pid_entries(line);
            continue;
        }
        if LOADAVG_LINE.is_match(line) {
            report.load = parse_loadavg(line);
            report.thread_count = report.load.total;
            in_listing = true;
            continue;
        }

        let mut parts = line.split_whitespace();
        let Some(label) = parts.next() else {
            continue;
        };
        if label == "cpu" {
            report.cpu.aggregate = CpuTimes::from_fields(&numeric_fields(parts));
        } else if is_core_label(label) {
            let times = CpuTimes::from_fields(&numeric_fields(parts));
            report.cpu.cores.push(CoreJiffies {
                label: label.to_string(),
                active: times.active(),
                total: times.total(),
            });
        } else if is_pid(label) && parts.next().is_none() {
            // Listing without a loadavg line ahead of it
            report.process_count += 1;
        }
    }

    report
}

/// Parses a single `/proc/loadavg` line
#[must_use]
pub fn parse_loadavg(line: &str) -> LoadAverage {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 4 {
        return LoadAverage::default();
    }
    let (running, total) = parts[3]
        .split_once('/')
        .map(|(r, t)| (r.parse().unwrap_or(0), t.parse().unwrap_or(0)))
        .unwrap_or((0, 0));

    LoadAverage {
        one: parts[0].parse().unwrap_or(0.0),
        five: parts[1].parse().unwrap_or(0.0),
        fifteen: parts[2].parse().unwrap_or(0.0),
        running,
        total,
    }
}

fn numeric_fields<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<u64> {
    parts.map(|p| p.parse().unwrap_or(0)).collect()
}

fn is_core_label(label: &str) -> bool {
    label
        .strip_prefix("cpu")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

fn is_pid(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn count_pid_entries(line: &str) -> u32 {
    line.split_whitespace().filter(|t| is_pid(t)).count() as u32
}
