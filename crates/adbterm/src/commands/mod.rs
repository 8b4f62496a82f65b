//! Subcommand handlers.

pub mod config_cmd;
pub mod run;
pub mod setup;

use adbterm_config::Config;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load the config file named by `--config` (or the default one) and apply
/// command-line overrides.
pub fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = global
        .config
        .clone()
        .unwrap_or_else(adbterm_config::config_path);
    let mut config = adbterm_config::load_config_from(&path)?;

    if let Some(ms) = global.poll_interval {
        config.session.poll_interval_ms = ms;
        config.validate()?;
    }
    Ok(config)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Terminal {
        message: format!("prompt failed: {e}"),
    }
}
