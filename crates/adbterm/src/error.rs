//! CLI error types with miette diagnostics.
//!
//! Maps `ConfigError` and `CoreError` into user-facing errors with
//! actionable help text. Every variant is fatal.

use miette::Diagnostic;
use thiserror::Error;

use adbterm_config::ConfigError;
use adbterm_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const FATAL: i32 = 1;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Dependencies ─────────────────────────────────────────────────
    #[error("{tools} : not found on your computer")]
    #[diagnostic(
        code(adbterm::missing_tools),
        help(
            "Run `adbterm setup` to locate the Android SDK folders,\n\
             or set PLATFORMTOOLS_PATH / BUILDTOOLS_PATH."
        )
    )]
    MissingTools { tools: String },

    #[error("Cannot run {program}")]
    #[diagnostic(
        code(adbterm::tool_failed),
        help("{reason}\nCheck the tool folders with: adbterm config")
    )]
    ToolFailed { program: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    #[diagnostic(code(adbterm::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(
        code(adbterm::config),
        help("Fix or remove the config file, see: adbterm config path")
    )]
    Config(Box<figment::Error>),

    #[error("Cannot save the configuration: {0}")]
    #[diagnostic(code(adbterm::config_write))]
    ConfigWrite(String),

    // ── Session ──────────────────────────────────────────────────────
    #[error("Session record unusable: {message}")]
    #[diagnostic(
        code(adbterm::session),
        help("Re-pair the device with: adbterm pair")
    )]
    Session { message: String },

    #[error("Pairing failed")]
    #[diagnostic(
        code(adbterm::pair_failed),
        help(
            "{reason}\nOn the device, open Developer options > Wireless debugging >\n\
             Pair device with pairing code, then run: adbterm pair"
        )
    )]
    PairFailed { reason: String },

    #[error("Device error: {message}")]
    #[diagnostic(code(adbterm::device))]
    Device { message: String },

    // ── Terminal ─────────────────────────────────────────────────────
    #[error("Terminal error: {message}")]
    #[diagnostic(code(adbterm::terminal))]
    Terminal { message: String },

    /// The operator interrupted a startup prompt.
    #[error("Interrupted")]
    Interrupted,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Interrupted => exit_code::SUCCESS,
            _ => exit_code::FATAL,
        }
    }
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

// ── ConfigError → CliError mapping ──────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingTools { tools } => CliError::MissingTools {
                tools: tools.join(", "),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Serialization(e) => CliError::ConfigWrite(e.to_string()),
            ConfigError::Json(e) => CliError::Session {
                message: e.to_string(),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Interrupted => CliError::Interrupted,
            CoreError::ToolUnavailable { program, reason } => {
                CliError::ToolFailed { program, reason }
            }
            CoreError::Persistence { message } => CliError::Session { message },
            CoreError::Prompt { message } => CliError::Terminal { message },
            CoreError::Io(e) => CliError::Io(e),
            other => CliError::Device {
                message: other.to_string(),
            },
        }
    }
}
