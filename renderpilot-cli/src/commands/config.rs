//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config list`, and `config path` commands
//! for viewing and modifying configuration settings from the command line.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use renderpilot::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., resolution.min_scale)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., resolution.min_scale)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand against `file`, or the user config when `None`.
pub fn run(command: ConfigCommands, file: Option<&Path>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(&key, file),
        ConfigCommands::Set { key, value } => run_set(&key, &value, file),
        ConfigCommands::List => run_list(file),
        ConfigCommands::Path => run_path(file),
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'renderpilot config list' to see available keys.",
            key
        ))
    })
}

fn target_path(file: Option<&Path>) -> PathBuf {
    file.map(Path::to_path_buf).unwrap_or_else(config_file_path)
}

/// Load the target file; a missing file yields the defaults.
fn load(file: Option<&Path>) -> Result<ConfigFile, CliError> {
    let path = target_path(file);
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    Ok(ConfigFile::load_from(&path)?)
}

/// Get a configuration value.
fn run_get(key: &str, file: Option<&Path>) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let config = load(file)?;
    let value = config_key.get(&config);

    if value.is_empty() {
        println!("(not set)");
    } else {
        println!("{}", value);
    }

    Ok(())
}

/// Set a configuration value.
fn run_set(key: &str, value: &str, file: Option<&Path>) -> Result<(), CliError> {
    let config_key = parse_key(key)?;

    let mut config = load(file)?;
    config_key
        .set(&mut config, value)
        .map_err(|e| CliError::Config(e.to_string()))?;
    config.validate()?;
    config.save_to(&target_path(file))?;

    println!("Set {} = {}", config_key.name(), config_key.get(&config));

    Ok(())
}

/// List all configuration settings.
fn run_list(file: Option<&Path>) -> Result<(), CliError> {
    let config = load(file)?;

    println!("Configuration Settings");
    println!("======================");
    println!();

    let mut current_section = "";

    for key in ConfigKey::all() {
        let section = key.section();

        if section != current_section {
            if !current_section.is_empty() {
                println!();
            }
            println!("[{}]", section);
            current_section = section;
        }

        let value = key.get(&config);
        let key_name = key.key_name();

        if value.is_empty() {
            println!("  {} = (not set)", key_name);
        } else {
            println!("  {} = {}", key_name, value);
        }
    }

    Ok(())
}

/// Show the configuration file path.
fn run_path(file: Option<&Path>) -> Result<(), CliError> {
    println!("{}", target_path(file).display());
    Ok(())
}
