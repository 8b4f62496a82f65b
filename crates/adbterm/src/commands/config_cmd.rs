//! Config subcommand handlers.

use std::fmt::Write;

use adbterm_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;

/// Resolved locations, one `key = "value"` line each.
fn format_locations(global: &GlobalOpts, config: Option<&Config>) -> String {
    let config_file = global
        .config
        .clone()
        .unwrap_or_else(adbterm_config::config_path);

    let mut out = String::new();
    let _ = writeln!(out, "config = \"{}\"", config_file.display());
    let _ = writeln!(
        out,
        "session = \"{}\"",
        adbterm_config::session_path().display()
    );
    let _ = writeln!(out, "log_dir = \"{}\"", adbterm_config::log_dir().display());
    if let Some(config) = config {
        let _ = writeln!(out, "search_root = \"{}\"", config.search_root().display());
        let _ = writeln!(
            out,
            "local_downloads = \"{}\"",
            config.local_downloads().display()
        );
        let _ = writeln!(out, "extract_dir = \"{}\"", config.extract_dir().display());
    }
    out
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command.unwrap_or(ConfigCommand::Show) {
        ConfigCommand::Show => {
            let config = super::load_config(global)?;
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| CliError::ConfigWrite(e.to_string()))?;
            println!("{}", rendered.trim_end());
            println!();
            println!("# resolved locations");
            for line in format_locations(global, Some(&config)).lines() {
                println!("# {line}");
            }
            Ok(())
        }
        ConfigCommand::Path => {
            print!("{}", format_locations(global, None));
            Ok(())
        }
    }
}
