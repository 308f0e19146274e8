//! `/proc/vmstat` paging counters + `dumpsys diskstats`

use std::sync::LazyLock;

use regex::Regex;

use super::first_u64;
use crate::metrics::DiskSnapshot;

static LATENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Latency:\s*(\d+)\s*ms").expect("LATENCY is a valid regex pattern")
});

static WRITE_SPEED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Recent Disk Write Speed \(kB/s\)\s*=\s*(\d+)")
        .expect("WRITE_SPEED is a valid regex pattern")
});

/// Parses `pgpgin`/`pgpgout` (KiB, converted to bytes) and the diskstats
/// latency and write speed lines
#[must_use]
pub fn parse_disk(text: &str) -> DiskSnapshot {
    let mut disk = DiskSnapshot::default();

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("pgpgin ") {
            disk.paged_in_bytes = first_u64(rest).saturating_mul(1024);
        } else if let Some(rest) = line.strip_prefix("pgpgout ") {
            disk.paged_out_bytes = first_u64(rest).saturating_mul(1024);
        } else if let Some(caps) = LATENCY.captures(line) {
            disk.latency_ms = caps[1].parse().ok();
        } else if let Some(caps) = WRITE_SPEED.captures(line) {
            disk.recent_write_kib_per_sec = caps[1].parse().ok();
        }
    }

    disk
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vmstat_and_diskstats() {
        let text = "\
pgpgin 3145728
pgpgout 1048576
Latency: 2ms [512B Data Write]
Recent Disk Write Speed (kB/s) = 53214
";
        let disk = parse_disk(text);
        assert_eq!(disk.paged_in_bytes, 3_221_225_472);
        assert_eq!(disk.paged_out_bytes, 1_073_741_824);
        assert_eq!(disk.latency_ms, Some(2));
        assert_eq!(disk.recent_write_kib_per_sec, Some(53_214));
    }

    #[test]
    fn test_missing_diskstats() {
        let disk = parse_disk("pgpgin 10\npgpgout 20\n");
        assert_eq!(disk.paged_in_bytes, 10_240);
        assert!(disk.latency_ms.is_none());
        assert!(disk.recent_write_kib_per_sec.is_none());
    }

    #[test]
    fn test_empty() {
        assert_eq!(parse_disk(""), DiskSnapshot::default());
    }
}
