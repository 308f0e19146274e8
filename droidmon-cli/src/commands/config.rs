//! Configuration file commands.

use droidmon_core::config::AppSettings;

use crate::cli::ConfigCommands;
use crate::error::CliError;
use crate::util::{CliContext, create_config_manager, load_settings};

/// Config command handler
pub fn cmd_config(context: &CliContext, subcmd: ConfigCommands) -> Result<(), CliError> {
    match subcmd {
        ConfigCommands::Init { force } => cmd_init(context, force),
        ConfigCommands::Show { json } => cmd_show(context, json),
        ConfigCommands::Path => {
            let manager = create_config_manager(context.config_path.as_deref())?;
            println!("{}", manager.settings_path().display());
            Ok(())
        }
    }
}

fn cmd_init(context: &CliContext, force: bool) -> Result<(), CliError> {
    let manager = create_config_manager(context.config_path.as_deref())?;
    let path = manager.settings_path();
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    let written = manager.save_settings(&AppSettings::default())?;
    if !context.quiet {
        println!("Wrote {}", written.display());
    }
    Ok(())
}

fn cmd_show(context: &CliContext, json: bool) -> Result<(), CliError> {
    let settings = load_settings(context)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        let text = toml::to_string_pretty(&settings)
            .map_err(|e| CliError::Output(format!("Failed to serialize to TOML: {e}")))?;
        print!("{text}");
    }
    Ok(())
}
