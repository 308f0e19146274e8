//! `droidmon` CLI - Android device telemetry over adb
//!
//! One-shot snapshots, a streaming watch mode, a process table, device
//! actions (connect, install, uninstall, kill) and package listing.

mod cli;
mod commands;
mod error;
mod format;
mod util;

use clap::Parser;
use cli::Cli;
use util::CliContext;

fn main() {
    let cli = Cli::parse();
    let context = CliContext {
        config_path: cli.config,
        serial: cli.serial,
        adb_path: cli.adb,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let result = commands::dispatch(&context, cli.command);

    if let Err(e) = result {
        if !context.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}
