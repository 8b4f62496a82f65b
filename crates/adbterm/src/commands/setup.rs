//! `adbterm setup`: locate the Android SDK tool folders and save them.

use std::path::PathBuf;

use dialoguer::Input;

use adbterm_config::tools::{self, TOOL_GROUPS, ToolGroup};

use super::prompt_err;
use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Ask for `group`'s folder until the operator gives an existing path.
fn ask_folder(group: &ToolGroup) -> Result<PathBuf, CliError> {
    loop {
        let answer: String = Input::new()
            .with_prompt(format!("[?] Enter the path of {} folder", group.name))
            .interact_text()
            .map_err(prompt_err)?;

        let folder = PathBuf::from(answer.trim());
        if folder.exists() {
            return Ok(tools::validate_folder(group, &folder)?);
        }
        println!("[!] The path given is not valid");
    }
}

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let path = global
        .config
        .clone()
        .unwrap_or_else(adbterm_config::config_path);
    let mut config = adbterm_config::load_config_from(&path)?;

    println!("[*] Type required tools paths");
    for group in &TOOL_GROUPS {
        if tools::missing_tools(group, None).is_empty() {
            println!("[+] {} present in the PATH", group.tools.join(", "));
            continue;
        }
        let folder = ask_folder(group)?;
        config.tools.set_folder(group, folder);
    }

    println!("[*] Saving {}", path.display());
    adbterm_config::save_config_to(&config, &path)?;
    println!("[+] configuration saved");
    Ok(())
}
