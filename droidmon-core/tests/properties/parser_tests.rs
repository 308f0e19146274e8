//! Property-based tests for the telemetry parsers
//!
//! Parsers never fail: unparseable input degrades to defaults, and well
//! formed readings come back with their units converted.

use droidmon_core::parser::{
    parse_cpu_report, parse_disk, parse_meminfo, parse_net_dev, parse_thermal, parse_uptime,
};
use proptest::prelude::*;

/// Strategy for arbitrary multi-line text
fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec("[ -~]{0,60}", 0..20).prop_map(|lines| lines.join("\n"))
}

/// Strategy for a kB reading
fn arb_kib() -> impl Strategy<Value = u64> {
    0u64..1_000_000_000
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// No parser panics on arbitrary printable input
    #[test]
    fn prop_parsers_accept_garbage(text in arb_text()) {
        let _ = parse_meminfo(&text);
        let _ = parse_cpu_report(&text);
        let _ = parse_net_dev(&text);
        let _ = parse_disk(&text);
        let _ = parse_thermal(&text);
        let _ = parse_uptime(&text);
    }

    /// Memory readings are converted from kB to bytes
    #[test]
    fn prop_meminfo_in_bytes(total in arb_kib(), available in arb_kib()) {
        let text = format!("MemTotal: {total} kB\nMemAvailable: {available} kB\n");
        let mem = parse_meminfo(&text);
        prop_assert_eq!(mem.total_bytes, total * 1024);
        prop_assert_eq!(mem.available_bytes, available * 1024);
        prop_assert!(mem.used_bytes() <= mem.total_bytes);
    }

    /// Loopback traffic never counts towards the totals
    #[test]
    fn prop_net_dev_skips_loopback(lo in 0u64..1_000_000, wlan in 0u64..1_000_000) {
        let text = format!(
            "Inter-|   Receive                                                |  Transmit\n \
             face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n    \
             lo: {lo} 10 0 0 0 0 0 0 {lo} 10 0 0 0 0 0 0\n  \
             wlan0: {wlan} 5 0 0 0 0 0 0 {wlan} 7 0 0 0 0 0 0\n"
        );
        let net = parse_net_dev(&text);
        prop_assert_eq!(net.rx_bytes, wlan);
        prop_assert_eq!(net.tx_bytes, wlan);
        prop_assert_eq!(net.rx_packets, 5);
        prop_assert_eq!(net.tx_packets, 7);
    }

    /// Day and hour-minute uptimes add up
    #[test]
    fn prop_uptime_days_and_clock(days in 1u64..400, hours in 0u64..24, minutes in 0u64..60) {
        let text = format!(
            " 12:00:00 up {days} days, {hours:>2}:{minutes:02},  1 user,  load average: 0.5, 0.4, 0.3"
        );
        let uptime = parse_uptime(&text).expect("well-formed uptime");
        prop_assert_eq!(uptime.as_secs(), days * 86_400 + hours * 3600 + minutes * 60);
    }
}
