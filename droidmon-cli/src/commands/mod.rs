//! Command handler modules for the CLI.

mod action;
mod completions;
mod config;
mod info;
mod packages;
mod snapshot;
mod stream;
mod top;
mod watch;

use crate::cli::Commands;
use crate::error::CliError;
use crate::util::CliContext;

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(context: &CliContext, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Snapshot { format, interval } => {
            snapshot::cmd_snapshot(context, format, interval)
        }
        Commands::Watch {
            format,
            interval,
            count,
        } => watch::cmd_watch(context, format, interval, count),
        Commands::Top {
            format,
            limit,
            apps,
            interval,
            count,
        } => top::cmd_top(
            context,
            top::TopParams {
                format,
                limit,
                apps_only: apps,
                interval,
                count,
            },
        ),
        Commands::Info { format } => info::cmd_info(context, format),
        Commands::Connect { address } => action::cmd_connect(context, &address),
        Commands::Install { apk } => action::cmd_install(context, &apk),
        Commands::Uninstall { package } => action::cmd_uninstall(context, &package),
        Commands::Kill { pid } => action::cmd_kill(context, pid),
        Commands::Packages { format, all, sizes } => {
            packages::cmd_packages(context, format, !all, sizes)
        }
        Commands::Config(subcmd) => config::cmd_config(context, subcmd),
        Commands::Completions { shell } => completions::cmd_completions(shell),
    }
}
