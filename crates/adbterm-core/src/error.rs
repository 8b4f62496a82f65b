// ── Core error types ──
//
// Errors surfaced by the session layer. Tool-level failures from
// adbterm-api are folded into these variants so callers never match on
// process or archive details directly.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Device errors ────────────────────────────────────────────────
    #[error("Device unavailable: {reason}")]
    DeviceUnavailable { reason: String },

    /// A device primitive ran and reported failure.
    #[error("`{command}` failed: {detail}")]
    CommandFailed { command: String, detail: String },

    #[error("Cannot run {program}: {reason}")]
    ToolUnavailable { program: String, reason: String },

    // ── Install errors ───────────────────────────────────────────────
    #[error("Unsupported file format '.{extension}'")]
    UnsupportedFormat { extension: String },

    #[error("Invalid archive: {message}")]
    Archive { message: String },

    #[error("Package metadata unavailable: {message}")]
    Metadata { message: String },

    // ── Operator errors ──────────────────────────────────────────────
    #[error("Prompt failed: {message}")]
    Prompt { message: String },

    /// The operator interrupted a prompt (Ctrl-C).
    #[error("Interrupted by operator")]
    Interrupted,

    // ── Persistence errors ───────────────────────────────────────────
    #[error("Cannot persist session: {message}")]
    Persistence { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from tool-layer errors ────────────────────────────────

impl From<adbterm_api::Error> for CoreError {
    fn from(err: adbterm_api::Error) -> Self {
        match err {
            adbterm_api::Error::Spawn { program, source } => CoreError::ToolUnavailable {
                program,
                reason: source.to_string(),
            },
            adbterm_api::Error::Io(e) => CoreError::Io(e),
            adbterm_api::Error::Archive { path, source } => CoreError::Archive {
                message: format!("{path}: {source}"),
            },
            adbterm_api::Error::UnsupportedUnit { extension, .. } => {
                CoreError::UnsupportedFormat { extension }
            }
            adbterm_api::Error::InvalidKeyCombination { count } => {
                CoreError::Internal(format!("key combination with {count} key(s)"))
            }
            adbterm_api::Error::Badging { detail } => CoreError::Metadata { message: detail },
        }
    }
}
