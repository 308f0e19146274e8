//! Installed packages command.

use std::fmt::Write as _;

use droidmon_core::DeviceClient;
use droidmon_core::adb::CancellationToken;
use droidmon_core::packages::{PackageEntry, list_packages, package_size_kib};
use futures::future::join_all;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::format::{UNAVAILABLE, human_bytes};
use crate::util::{CliContext, create_runtime, no_response, prepare};

/// Packages command handler
///
/// Size measurements are queued on the device's measurement gate, so they
/// run one at a time however many packages are listed.
pub fn cmd_packages(
    context: &CliContext,
    format: OutputFormat,
    third_party_only: bool,
    sizes: bool,
) -> Result<(), CliError> {
    let settings = prepare(context)?;
    let runtime = create_runtime()?;

    let entries = runtime.block_on(async {
        let client = DeviceClient::new(&settings.adb);
        let cancel = CancellationToken::new();

        let Some(names) = list_packages(&client, third_party_only, &cancel).await else {
            return Err(no_response(&settings.adb));
        };

        let entries: Vec<PackageEntry> = if sizes {
            let measured = join_all(
                names
                    .iter()
                    .map(|name| package_size_kib(&client, name, &cancel)),
            )
            .await;
            let unmeasured = measured.iter().filter(|s| s.is_none()).count();
            if unmeasured > 0 {
                tracing::warn!(unmeasured, "Some package sizes could not be measured");
            }
            names
                .into_iter()
                .zip(measured)
                .map(|(name, size_kib)| PackageEntry { name, size_kib })
                .collect()
        } else {
            names
                .into_iter()
                .map(|name| PackageEntry {
                    name,
                    size_kib: None,
                })
                .collect()
        };
        Ok(entries)
    })?;

    match format {
        OutputFormat::Table => println!("{}", format_table(&entries, sizes)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
    }
    Ok(())
}

/// Format packages as a table string
#[must_use]
pub fn format_table(entries: &[PackageEntry], sizes: bool) -> String {
    if entries.is_empty() {
        return "No packages found.".to_string();
    }
    if !sizes {
        return entries
            .iter()
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>()
            .join("\n");
    }

    let name_width = entries
        .iter()
        .map(|e| e.name.len())
        .max()
        .unwrap_or(7)
        .max(7);
    let mut output = String::new();
    let _ = writeln!(output, "{:<name_width$}  {:>10}", "PACKAGE", "SIZE");
    for entry in entries {
        let size = entry.size_kib.map_or_else(
            || UNAVAILABLE.to_string(),
            |kib| human_bytes(kib.saturating_mul(1024)),
        );
        let _ = writeln!(output, "{:<name_width$}  {size:>10}", entry.name);
    }
    output.trim_end().to_string()
}
