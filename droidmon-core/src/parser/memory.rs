//! `/proc/meminfo`

use super::first_u64;
use crate::metrics::MemorySnapshot;

/// Parses `/proc/meminfo`. Values are `<n> kB` and are converted to bytes.
#[must_use]
pub fn parse_meminfo(text: &str) -> MemorySnapshot {
    let mut mem = MemorySnapshot::default();

    for line in text.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let bytes = first_u64(rest).saturating_mul(1024);
        match key.trim() {
            "MemTotal" => mem.total_bytes = bytes,
            "MemFree" => mem.free_bytes = bytes,
            "MemAvailable" => mem.available_bytes = bytes,
            "Buffers" => mem.buffers_bytes = bytes,
            "Cached" => mem.cached_bytes = bytes,
            "SwapTotal" => mem.swap_total_bytes = bytes,
            "SwapFree" => mem.swap_free_bytes = bytes,
            _ => {}
        }
    }

    mem
}
