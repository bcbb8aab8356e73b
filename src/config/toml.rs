//! TOML configuration file parsing

use super::cli::Cli;
use super::cli_convert::{apply_flags, positional_config};
use super::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
///
/// Complete positional arguments replace the file's workload mix, timing and
/// target path. Settings only the file can express (seed, pattern, output,
/// runtime) survive unless a flag overrides them.
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    if let Some(positional) = positional_config(cli)? {
        for class in crate::workload::TaskClass::ALL {
            *config.workload.class_mut(class) = *positional.workload.class(class);
        }
        config.workload.duration_secs = positional.workload.duration_secs;
        config.workload.interval_secs = positional.workload.interval_secs;
        config.target.path = positional.target.path;
    }

    apply_flags(cli, &mut config)?;
    Ok(config)
}
