//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config list` and `config path` for
//! viewing and modifying settings from the command line.

use std::path::Path;

use clap::Subcommand;
use territory::config::{ConfigFile, ConfigKey};

use crate::error::CliError;
use crate::runner::{effective_config_path, load_config};

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., union.fine_tolerance)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., union.fine_tolerance)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand against `config_path` or the default file.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => {
            let config = load_config(config_path)?;
            println!("{}", display_value(&get_value(&config, &key)?));
            Ok(())
        }
        ConfigCommands::Set { key, value } => {
            let path = effective_config_path(config_path);
            let mut config = load_config(config_path)?;
            let config_key = set_value(&mut config, &key, &value)?;
            config.save_to(&path)?;
            println!("Set {} = {}", config_key.name(), value);
            Ok(())
        }
        ConfigCommands::List => {
            let config = load_config(config_path)?;
            print!("{}", list(&config));
            Ok(())
        }
        ConfigCommands::Path => {
            println!("{}", effective_config_path(config_path).display());
            Ok(())
        }
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'territory config list' to see available keys.",
            key
        ))
    })
}

fn get_value(config: &ConfigFile, key: &str) -> Result<String, CliError> {
    Ok(parse_key(key)?.get(config))
}

fn set_value(config: &mut ConfigFile, key: &str, value: &str) -> Result<ConfigKey, CliError> {
    let config_key = parse_key(key)?;
    config_key
        .set(config, value)
        .map_err(|e| CliError::Config(e.to_string()))?;
    Ok(config_key)
}

fn display_value(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

/// Render every key grouped by section.
fn list(config: &ConfigFile) -> String {
    let mut out = String::from("Configuration Settings\n======================\n");
    let mut current_section = "";

    for key in ConfigKey::all() {
        let section = key.section();
        if section != current_section {
            out.push_str(&format!("\n[{}]\n", section));
            current_section = section;
        }
        out.push_str(&format!(
            "  {} = {}\n",
            key.key_name(),
            display_value(&key.get(config))
        ));
    }

    out
}
