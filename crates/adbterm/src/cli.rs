//! Clap derive structures for the `adbterm` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// adbterm -- interactive terminal for an Android device over ADB Wi-Fi
#[derive(Debug, Parser)]
#[command(
    name = "adbterm",
    version,
    about = "Control an Android device over ADB Wi-Fi from an interactive prompt",
    long_about = "Keeps a control session with one Android device reachable over \
        ADB Wi-Fi.\n\nType text to send it to the device, or use the built-in \
        commands (.install, .push, .pull, .on_screen, .off_screen, .dev-off, \
        .get-devices, .termux-passwd, .quit). The session survives link drops \
        and resumes when the device comes back.",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Option<Command>,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Link poll interval in milliseconds (overrides config)
    #[arg(long, global = true, value_name = "MS")]
    pub poll_interval: Option<u64>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect to the saved device and start the prompt (default)
    Run,

    /// Pair a new device, replacing the saved one, then start the prompt
    Pair,

    /// Interactively locate the platform-tools and build-tools folders
    Setup,

    /// Inspect the configuration
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: Option<ConfigCommand>,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the resolved configuration (default)
    Show,

    /// Print the config, session and log file locations
    Path,
}
