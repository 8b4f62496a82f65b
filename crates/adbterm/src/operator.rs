//! Console rendition of the operator: colored status markers on stdout
//! and raw-mode questions.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;

use adbterm_core::{CoreError, Notice, NoticeLevel, Operator};

use crate::cli::ColorMode;
use crate::terminal;

pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Render a notice as one line, marker colored by level when enabled.
pub fn format_notice(notice: &Notice, color: bool) -> String {
    let Some(marker) = notice.level.marker() else {
        return notice.message.clone();
    };
    if !color {
        return format!("{marker} {}", notice.message);
    }
    let marker = match notice.level {
        NoticeLevel::Info => marker.cyan().to_string(),
        NoticeLevel::Success => marker.green().to_string(),
        NoticeLevel::Warning => marker.yellow().to_string(),
        NoticeLevel::Failure => marker.red().to_string(),
        NoticeLevel::Plain => marker.to_owned(),
    };
    format!("{marker} {}", notice.message)
}

fn answer_is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[derive(Debug, Clone, Copy)]
pub struct ConsoleOperator {
    color: bool,
}

impl ConsoleOperator {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            color: should_color(mode),
        }
    }

    fn ask(&self, prompt: &str) -> Result<Option<String>, CoreError> {
        let marker = if self.color {
            "[?]".magenta().to_string()
        } else {
            "[?]".to_owned()
        };
        let prompt = format!("{marker} {prompt}");
        // Questions come from async code on the runtime; the read blocks.
        tokio::task::block_in_place(|| terminal::read_line_blocking(&prompt)).map_err(|e| {
            CoreError::Prompt {
                message: e.to_string(),
            }
        })
    }
}

impl Operator for ConsoleOperator {
    fn notify(&self, notice: &Notice) {
        let mut out = io::stdout().lock();
        // Raw mode may be active while the prompt is pending.
        let _ = write!(out, "\r{}\r\n", format_notice(notice, self.color));
        let _ = out.flush();
    }

    fn confirm(&self, prompt: &str) -> Result<bool, CoreError> {
        match self.ask(&format!("{prompt} [y/n] "))? {
            Some(answer) => Ok(answer_is_yes(&answer)),
            None => Err(CoreError::Interrupted),
        }
    }

    fn input(&self, prompt: &str) -> Result<Option<String>, CoreError> {
        self.ask(&format!("{prompt}: "))
    }
}
