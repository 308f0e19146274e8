//! Device action commands: connect, install, uninstall, kill.

use std::path::Path;

use droidmon_core::DeviceClient;
use droidmon_core::actions::{self, ActionOutcome};

use crate::error::CliError;
use crate::util::{CliContext, create_runtime, prepare};

/// Prints whatever the action wrote, stdout first
fn print_outcome(outcome: &ActionOutcome) {
    let stdout = outcome.stdout.trim();
    if !stdout.is_empty() {
        println!("{stdout}");
    }
    let stderr = outcome.stderr.trim();
    if !stderr.is_empty() {
        eprintln!("{stderr}");
    }
}

fn run<F, Fut>(context: &CliContext, action: F) -> Result<(), CliError>
where
    F: FnOnce(DeviceClient) -> Fut,
    Fut: Future<Output = actions::ActionResult>,
{
    let settings = prepare(context)?;
    let runtime = create_runtime()?;
    let client = DeviceClient::new(&settings.adb);
    let outcome = runtime.block_on(action(client))?;
    print_outcome(&outcome);
    Ok(())
}

/// Connect command handler
pub fn cmd_connect(context: &CliContext, address: &str) -> Result<(), CliError> {
    run(context, |client| async move { actions::connect(&client, address).await })
}

/// Install command handler
pub fn cmd_install(context: &CliContext, apk: &Path) -> Result<(), CliError> {
    if !context.quiet {
        eprintln!("Installing {}...", apk.display());
    }
    run(context, |client| async move { actions::install(&client, apk).await })
}

/// Uninstall command handler
pub fn cmd_uninstall(context: &CliContext, package: &str) -> Result<(), CliError> {
    run(context, |client| async move { actions::uninstall(&client, package).await })
}

/// Kill command handler
pub fn cmd_kill(context: &CliContext, pid: u32) -> Result<(), CliError> {
    run(context, |client| async move { actions::kill(&client, pid).await })
}
