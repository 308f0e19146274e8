//! `getprop` reads for [`DeviceInfo`]

use super::uptime::parse_uptime;
use crate::batch::SectionMap;
use crate::metrics::DeviceInfo;
use crate::queries::device_ids;

/// Returns a property value: the first non-empty line, trimmed
#[must_use]
pub fn property_value(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
        .to_string()
}

/// Builds [`DeviceInfo`] from the device-info batch sections
#[must_use]
pub fn parse_device_info(sections: &SectionMap) -> DeviceInfo {
    let prop = |id: &str| property_value(sections.text(id));

    DeviceInfo {
        model: prop(device_ids::MODEL),
        manufacturer: prop(device_ids::MANUFACTURER),
        android_version: prop(device_ids::RELEASE),
        sdk_level: prop(device_ids::SDK).parse().ok(),
        abi: prop(device_ids::ABI),
        uptime: parse_uptime(sections.text(device_ids::UPTIME)),
    }
}
