//! Installed package enumeration and size measurement
//!
//! These run as one-off processes so they can overlap the poll loop's
//! session traffic. Size measurement walks the package's code directory on
//! the device and is gated to one at a time per device.

use serde::Serialize;

use crate::actions::is_valid_package_name;
use crate::adb::CancellationToken;
use crate::client::DeviceClient;

/// One installed package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageEntry {
    /// Package name
    pub name: String,
    /// Code size in KiB, if measured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_kib: Option<u64>,
}

/// Command listing installed packages
#[must_use]
pub fn list_command(third_party_only: bool) -> &'static str {
    if third_party_only {
        "pm list packages -3"
    } else {
        "pm list packages"
    }
}

/// Parses `package:<name>` lines, sorted and deduplicated
#[must_use]
pub fn parse_package_list(text: &str) -> Vec<String> {
    let mut names: Vec<String> = text
        .lines()
        .filter_map(|l| l.trim().strip_prefix("package:"))
        .map(str::trim)
        .filter(|n| is_valid_package_name(n))
        .map(str::to_string)
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Directory holding the first APK from `pm path` output
#[must_use]
pub fn parse_code_dir(pm_path_output: &str) -> Option<String> {
    let apk = pm_path_output
        .lines()
        .find_map(|l| l.trim().strip_prefix("package:"))?
        .trim();
    let (dir, _) = apk.rsplit_once('/')?;
    if dir.is_empty() || dir.contains('\'') {
        return None;
    }
    Some(dir.to_string())
}

/// First number of `du -sk` output
#[must_use]
pub fn parse_du_kib(text: &str) -> Option<u64> {
    text.lines()
        .find_map(|l| l.split_whitespace().next()?.parse().ok())
}

/// Lists installed packages, optionally only third-party ones
pub async fn list_packages(
    client: &DeviceClient,
    third_party_only: bool,
    cancel: &CancellationToken,
) -> Option<Vec<String>> {
    let output = client
        .run_one_off(list_command(third_party_only), cancel)
        .await?;
    Some(parse_package_list(&output))
}

/// Measures a package's code directory in KiB
///
/// Waits for the device's measurement gate first; `None` on cancellation,
/// an invalid name, or any command failure.
pub async fn package_size_kib(
    client: &DeviceClient,
    package: &str,
    cancel: &CancellationToken,
) -> Option<u64> {
    if !is_valid_package_name(package) {
        return None;
    }
    let gate = client.measurement_gate();
    let _permit = tokio::select! {
        () = cancel.cancelled() => return None,
        permit = gate.acquire() => permit.ok()?,
    };

    let pm_path = client
        .run_one_off(&format!("pm path {package}"), cancel)
        .await?;
    let dir = parse_code_dir(&pm_path)?;
    let du = client
        .run_one_off(&format!("du -sk '{dir}'"), cancel)
        .await?;
    let size = parse_du_kib(&du);
    tracing::debug!(package, size_kib = ?size, "Measured package");
    size
}
