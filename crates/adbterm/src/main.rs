mod cli;
mod commands;
mod error;
mod operator;
mod terminal;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

// The prompt's blocking questions use `block_in_place`, which needs the
// multi-threaded runtime.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // stdout belongs to the prompt: logs go to a file
    let log_guard = init_tracing(cli.global.verbose);

    let result = run(cli).await;
    drop(log_guard);

    match result {
        Ok(()) => {}
        Err(CliError::Interrupted) => println!("\r\n[!] Program exit"),
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            std::process::exit(code);
        }
    }
}

/// Log to `<data dir>/adbterm.log`. Returns `None` (no logging) when the
/// file cannot be created.
fn init_tracing(verbosity: u8) -> Option<WorkerGuard> {
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("adbterm")
        .filename_suffix("log")
        .build(adbterm_config::log_dir())
        .ok()?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .init();

    Some(guard)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli { global, command } = cli;
    let command = command.unwrap_or(Command::Run);
    tracing::debug!(command = ?command, "dispatching command");

    match command {
        Command::Run => commands::run::handle(&global, false).await,
        Command::Pair => commands::run::handle(&global, true).await,
        Command::Setup => commands::setup::handle(&global),
        Command::Config(args) => commands::config_cmd::handle(args, &global),
    }
}
