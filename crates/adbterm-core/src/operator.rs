//! The operator's terminal, as seen by the core.
//!
//! [`Operator`] covers status output and the short blocking questions
//! asked mid-command; [`LineReader`] is the cancellable command prompt.

use std::fmt;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;

// ── Notices ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// `[*]` progress information.
    Info,
    /// `[+]` completed action.
    Success,
    /// `[!]` attention needed, nothing failed yet.
    Warning,
    /// `[-]` failed action.
    Failure,
    /// Printed as is.
    Plain,
}

impl NoticeLevel {
    pub fn marker(self) -> Option<&'static str> {
        match self {
            Self::Info => Some("[*]"),
            Self::Success => Some("[+]"),
            Self::Warning => Some("[!]"),
            Self::Failure => Some("[-]"),
            Self::Plain => None,
        }
    }
}

/// One line of status output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Failure, message)
    }

    pub fn plain(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Plain, message)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level.marker() {
            Some(marker) => write!(f, "{marker} {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

// ── Operator ─────────────────────────────────────────────────────

/// Status output and blocking questions.
///
/// Questions are only asked from the foreground; `notify` may be called
/// from the monitor task as well.
pub trait Operator: Send + Sync {
    fn notify(&self, notice: &Notice);

    /// Yes/no question.
    fn confirm(&self, prompt: &str) -> Result<bool, CoreError>;

    /// Free-text answer, `Ok(None)` when the operator interrupted the
    /// prompt. An empty answer is `Some("")`.
    fn input(&self, prompt: &str) -> Result<Option<String>, CoreError>;
}

// ── LineReader ───────────────────────────────────────────────────

/// How a prompt read ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Ctrl-C.
    Interrupted,
    /// Ctrl-D or closed input.
    EndOfInput,
    /// The read's cancellation token fired before a line was produced.
    Cancelled,
}

/// The command prompt. Implementations must return
/// [`ReadOutcome::Cancelled`] promptly once `cancel` fires, leaving the
/// terminal in its normal state.
#[async_trait]
pub trait LineReader: Send {
    async fn read_line(
        &mut self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<ReadOutcome, CoreError>;
}
