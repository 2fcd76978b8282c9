//! Config show/init commands.

use std::path::Path;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::OutputFormat;

/// Print the effective configuration.
pub fn config_show(config: &CliConfig, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Human => config.to_toml(),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(config)?),
    }
}

/// Write a default configuration file.
pub fn config_init(path: &Path, force: bool) -> CliResult<String> {
    if path.exists() && !force {
        return Err(CliError::user(format!(
            "{} already exists. Pass --force to overwrite.",
            path.display()
        )));
    }
    CliConfig::default().save(path)?;
    Ok(format!("Wrote {}", path.display()))
}
