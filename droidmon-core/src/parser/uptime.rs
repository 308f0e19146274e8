//! `uptime`
//!
//! Output looks like ` 14:23:45 up 2 days, 19:02,  0 users,  load average: ...`.
//! The duration ends at the first comma whose following segment is not a
//! clock reading, which separates `2 days, 19:02` from `2 days, 0 users`.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

static CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+):(\d{2})(?::(\d{2}))?$").expect("CLOCK is a valid regex pattern")
});

static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s*(days?|min|mins|hrs?|secs?)$").expect("AMOUNT is a valid regex pattern")
});

/// Parses the time since boot, or `None` if no duration is recognised
#[must_use]
pub fn parse_uptime(text: &str) -> Option<Duration> {
    let line = text.lines().find(|l| l.contains("up "))?;
    let (_, after) = line.split_once("up ")?;
    let segments: Vec<&str> = after.split(',').map(str::trim).collect();

    let mut secs: u64 = 0;
    let mut recognised = false;
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 && !is_duration_part(segment) {
            break;
        }
        match segment_secs(segment) {
            Some(s) => {
                secs = secs.saturating_add(s);
                recognised = true;
            }
            None => break,
        }
    }

    recognised.then(|| Duration::from_secs(secs))
}

/// A segment that continues the duration rather than starting the user count
fn is_duration_part(segment: &str) -> bool {
    CLOCK.is_match(segment)
        || AMOUNT
            .captures(segment)
            .is_some_and(|caps| !caps[2].starts_with("day"))
}

fn segment_secs(segment: &str) -> Option<u64> {
    if let Some(caps) = CLOCK.captures(segment) {
        let hours: u64 = caps[1].parse().ok()?;
        let minutes: u64 = caps[2].parse().ok()?;
        let seconds: u64 = caps.get(3).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        return Some(
            hours
                .saturating_mul(3600)
                .saturating_add(minutes * 60 + seconds),
        );
    }
    let caps = AMOUNT.captures(segment)?;
    let n: u64 = caps[1].parse().ok()?;
    let unit = &caps[2];
    let scale = if unit.starts_with("day") {
        86_400
    } else if unit.starts_with("hr") {
        3600
    } else if unit.starts_with("min") {
        60
    } else {
        1
    };
    Some(n.saturating_mul(scale))
}
