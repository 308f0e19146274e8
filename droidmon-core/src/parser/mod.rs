//! Parsers for the text each telemetry query produces
//!
//! Every parser takes one demultiplexed section and returns a typed value.
//! None of them fail: a missing field reads as zero (or `None` where the
//! type has an explicit optional), and unrecognised lines are skipped.

pub mod cpu;
pub mod device;
pub mod disk;
pub mod memory;
pub mod network;
pub mod thermal;
pub mod uptime;

pub use cpu::{CpuReport, parse_cpu_report};
pub use device::{parse_device_info, property_value};
pub use disk::parse_disk;
pub use memory::parse_meminfo;
pub use network::parse_net_dev;
pub use thermal::parse_thermal;
pub use uptime::parse_uptime;

/// Parses the first whitespace-separated token as a `u64`, or 0
pub(crate) fn first_u64(s: &str) -> u64 {
    s.split_whitespace()
        .next()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_u64() {
        assert_eq!(first_u64("   16384000 kB"), 16_384_000);
        assert_eq!(first_u64(""), 0);
        assert_eq!(first_u64("n/a kB"), 0);
    }
}
