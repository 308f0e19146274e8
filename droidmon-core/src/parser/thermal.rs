//! `dumpsys thermalservice`
//!
//! Only two blocks of the dump are read:
//!
//! ```text
//! Current temperatures from HAL:
//!     Temperature{mValue=35.5, mType=0, mName=cpu0, mStatus=0}
//! Current cooling devices from HAL:
//!     CoolingDevice{mValue=2, mType=0, mName=fan}
//! ```

use crate::metrics::{FanState, ThermalSnapshot, ThermalZone};

const TEMPERATURES_HEADER: &str = "Current temperatures from HAL";
const COOLING_PREFIX: &str = "Current cooling";
const COOLING_HEADER: &str = "Current cooling devices from HAL";

/// Parses zone temperatures and the fan level
#[must_use]
pub fn parse_thermal(text: &str) -> ThermalSnapshot {
    let mut snapshot = ThermalSnapshot::default();
    let mut in_temperatures = false;
    let mut in_cooling = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with(TEMPERATURES_HEADER) {
            in_temperatures = true;
            in_cooling = false;
            continue;
        }
        if trimmed.starts_with(COOLING_PREFIX) {
            in_temperatures = false;
            in_cooling = trimmed.starts_with(COOLING_HEADER);
            continue;
        }

        if in_temperatures {
            if let Some(zone) = parse_zone(trimmed) {
                snapshot.zones.push(zone);
            }
        } else if in_cooling
            && snapshot.fan.is_none()
            && let Some(level) = field_value(trimmed, "mValue=").and_then(parse_level)
        {
            snapshot.fan = Some(FanState::from_level(level));
            in_cooling = false;
        }
    }

    snapshot
}

fn parse_zone(line: &str) -> Option<ThermalZone> {
    let name = field_value(line, "mName=")?;
    let celsius: f32 = field_value(line, "mValue=")?.parse().ok()?;
    if name.is_empty() || !celsius.is_finite() {
        return None;
    }
    Some(ThermalZone {
        name: name.to_string(),
        celsius,
    })
}

fn parse_level(value: &str) -> Option<u32> {
    value.parse::<u32>().ok().or_else(|| {
        value
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u32)
    })
}

/// Returns the text after `key` up to the next `,`, space or `}`
fn field_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let start = line.find(key)? + key.len();
    let rest = &line[start..];
    let end = rest
        .find([',', ' ', '}'])
        .unwrap_or(rest.len());
    Some(&rest[..end])
}
