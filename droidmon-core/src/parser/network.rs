//! `/proc/net/dev`

use crate::metrics::NetworkSnapshot;

/// Sums rx/tx byte and packet counters over every interface except `lo`.
///
/// Format after the two header lines:
/// `iface: rx_bytes rx_packets errs drop fifo frame compressed multicast tx_bytes tx_packets ...`
#[must_use]
pub fn parse_net_dev(text: &str) -> NetworkSnapshot {
    let mut net = NetworkSnapshot::default();

    for line in text.lines() {
        if line.contains('|') {
            continue;
        }
        let Some((iface, stats)) = line.split_once(':') else {
            continue;
        };
        if iface.trim() == "lo" {
            continue;
        }
        let parts: Vec<u64> = stats
            .split_whitespace()
            .map(|p| p.parse().unwrap_or(0))
            .collect();
        if parts.len() < 10 {
            continue;
        }
        net.rx_bytes = net.rx_bytes.saturating_add(parts[0]);
        net.rx_packets = net.rx_packets.saturating_add(parts[1]);
        net.tx_bytes = net.tx_bytes.saturating_add(parts[8]);
        net.tx_packets = net.tx_packets.saturating_add(parts[9]);
    }

    net
}
