//! Property-based tests for the differencing engine
//!
//! Derived figures are either absent or sane: percentages stay within
//! 0–100, rates are never negative, and any counter that went backwards
//! suppresses the figures that depend on it.

use droidmon_core::diff::{busy_percent, cpu_breakdown, cpu_percent, rate};
use droidmon_core::metrics::CpuTimes;
use proptest::prelude::*;

/// Strategy for a jiffy counter small enough that sums never overflow
fn arb_jiffies() -> impl Strategy<Value = u64> {
    0u64..1_000_000_000
}

/// Strategy for a full set of CPU fields
fn arb_cpu_times() -> impl Strategy<Value = CpuTimes> {
    prop::collection::vec(arb_jiffies(), 8).prop_map(|f| CpuTimes::from_fields(&f))
}

/// Strategy for a pair of readings where every field advanced
fn arb_advancing_pair() -> impl Strategy<Value = (CpuTimes, CpuTimes)> {
    (
        arb_cpu_times(),
        prop::collection::vec(0u64..100_000, 8),
    )
        .prop_map(|(prev, deltas)| {
            let curr = CpuTimes {
                user: prev.user + deltas[0],
                nice: prev.nice + deltas[1],
                system: prev.system + deltas[2],
                idle: prev.idle + deltas[3],
                iowait: prev.iowait + deltas[4],
                irq: prev.irq + deltas[5],
                softirq: prev.softirq + deltas[6],
                steal: prev.steal + deltas[7],
            };
            (prev, curr)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// CPU usage, when produced, lies within 0–100
    #[test]
    fn prop_cpu_percent_bounded(prev in arb_cpu_times(), curr in arb_cpu_times()) {
        if let Some(pct) = cpu_percent(&prev, &curr) {
            prop_assert!((0.0..=100.0).contains(&pct));
        }
    }

    /// Advancing counters with a non-zero total delta always yield a figure
    #[test]
    fn prop_advancing_counters_yield_percent((prev, curr) in arb_advancing_pair()) {
        let pct = cpu_percent(&prev, &curr);
        if curr.total() > prev.total() {
            let pct = pct.expect("counters advanced");
            prop_assert!((0.0..=100.0).contains(&pct));
        } else {
            prop_assert!(pct.is_none());
        }
    }

    /// The user/system/idle split sums to 100
    #[test]
    fn prop_breakdown_sums_to_hundred((prev, curr) in arb_advancing_pair()) {
        if let Some(split) = cpu_breakdown(&prev, &curr) {
            let sum = split.user + split.system + split.idle;
            prop_assert!((sum - 100.0).abs() < 0.01, "sum was {sum}");
            prop_assert!(split.user >= 0.0 && split.system >= 0.0 && split.idle >= 0.0);
        }
    }

    /// Swapping the readings (a counter reset) never yields a figure
    #[test]
    fn prop_regression_suppresses_percent((prev, curr) in arb_advancing_pair()) {
        prop_assume!(curr.total() > prev.total());
        prop_assert!(cpu_percent(&curr, &prev).is_none());
        prop_assert!(
            busy_percent(curr.active(), curr.total(), prev.active(), prev.total()).is_none()
        );
    }

    /// Rates are non-negative, and absent on regression or non-positive time
    #[test]
    fn prop_rate_never_negative(
        prev in 0u64..u64::MAX / 2,
        curr in 0u64..u64::MAX / 2,
        elapsed in -5.0f64..60.0,
    ) {
        match rate(prev, curr, elapsed) {
            Some(r) => {
                prop_assert!(r >= 0.0);
                prop_assert!(curr >= prev && elapsed > 0.0);
            }
            None => prop_assert!(curr < prev || elapsed <= 0.0),
        }
    }
}

#[test]
fn test_rate_rejects_non_finite_elapsed() {
    assert!(rate(0, 10, f64::NAN).is_none());
    assert!(rate(0, 10, f64::INFINITY).is_none());
}
