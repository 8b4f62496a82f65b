//! Raw-mode line editing on top of crossterm.
//!
//! The prompt is read key by key so that a pending read can be abandoned
//! the moment the link drops. [`TerminalReader`] is the async, cancellable
//! command prompt; [`read_line_blocking`] serves the short mid-command
//! questions.

use std::io::{self, Write};

use async_trait::async_trait;
use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use adbterm_core::{CoreError, LineReader, ReadOutcome};

// ── Line editor ──────────────────────────────────────────────────────

/// Effect of one key on the line being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Continue,
    Submit(String),
    /// Ctrl-C.
    Interrupt,
    /// Ctrl-D on an empty line.
    EndOfInput,
}

/// Single-line buffer with a cursor, edited by key events.
#[derive(Debug, Default)]
pub struct LineEditor {
    buffer: Vec<char>,
    cursor: usize,
}

impl LineEditor {
    pub fn text(&self) -> String {
        self.buffer.iter().collect()
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn insert(&mut self, c: char) {
        self.buffer.insert(self.cursor, c);
        self.cursor += 1;
    }

    /// Insert pasted text; line breaks and other control characters are dropped.
    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars().filter(|c| !c.is_control()) {
            self.insert(c);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Edit {
        if key.kind == KeyEventKind::Release {
            return Edit::Continue;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') if ctrl => return Edit::Interrupt,
            KeyCode::Char('d') if ctrl => {
                if self.buffer.is_empty() {
                    return Edit::EndOfInput;
                }
                self.delete();
            }
            KeyCode::Char('u') if ctrl => {
                self.buffer.drain(..self.cursor);
                self.cursor = 0;
            }
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Char('e') if ctrl => self.cursor = self.buffer.len(),
            KeyCode::Char(c) if !ctrl => self.insert(c),
            KeyCode::Enter => {
                self.cursor = 0;
                return Edit::Submit(std::mem::take(&mut self.buffer).into_iter().collect());
            }
            KeyCode::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                self.buffer.remove(self.cursor);
            }
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.buffer.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.buffer.len(),
            _ => {}
        }
        Edit::Continue
    }

    fn delete(&mut self) {
        if self.cursor < self.buffer.len() {
            self.buffer.remove(self.cursor);
        }
    }
}

// ── Raw mode ─────────────────────────────────────────────────────────

/// Raw mode for the guard's lifetime.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn render(prompt: &str, editor: &LineEditor) -> io::Result<()> {
    let column = u16::try_from(prompt.chars().count() + editor.cursor()).unwrap_or(u16::MAX);
    let mut out = io::stdout();
    crossterm::queue!(
        out,
        Print('\r'),
        Clear(ClearType::CurrentLine),
        Print(prompt),
        Print(editor.text()),
        MoveToColumn(column)
    )?;
    out.flush()
}

fn finish_line() -> io::Result<()> {
    let mut out = io::stdout();
    out.write_all(b"\r\n")?;
    out.flush()
}

fn terminal_err(e: &io::Error) -> CoreError {
    CoreError::Prompt {
        message: e.to_string(),
    }
}

// ── Async prompt ─────────────────────────────────────────────────────

/// The `adb-term> ` prompt, abandoned as soon as its token fires.
#[derive(Default)]
pub struct TerminalReader {
    events: EventStream,
}

impl TerminalReader {
    pub fn new() -> Self {
        Self {
            events: EventStream::new(),
        }
    }
}

#[async_trait]
impl LineReader for TerminalReader {
    async fn read_line(
        &mut self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<ReadOutcome, CoreError> {
        let raw = RawMode::enable().map_err(|e| terminal_err(&e))?;
        let mut editor = LineEditor::default();
        render(prompt, &editor).map_err(|e| terminal_err(&e))?;

        let outcome = loop {
            let event = tokio::select! {
                biased;
                () = cancel.cancelled() => break ReadOutcome::Cancelled,
                event = self.events.next() => event,
            };
            match event {
                None => break ReadOutcome::EndOfInput,
                Some(Err(e)) => return Err(terminal_err(&e)),
                Some(Ok(Event::Key(key))) => match editor.handle_key(key) {
                    Edit::Continue => {}
                    Edit::Submit(line) => break ReadOutcome::Line(line),
                    Edit::Interrupt => break ReadOutcome::Interrupted,
                    Edit::EndOfInput => break ReadOutcome::EndOfInput,
                },
                Some(Ok(Event::Paste(text))) => editor.insert_str(&text),
                Some(Ok(_)) => continue,
            }
            render(prompt, &editor).map_err(|e| terminal_err(&e))?;
        };

        drop(raw);
        finish_line().map_err(|e| terminal_err(&e))?;
        Ok(outcome)
    }
}

// ── Blocking prompt ──────────────────────────────────────────────────

/// Read one answer synchronously. `None` when the operator pressed
/// Ctrl-C or Ctrl-D.
pub fn read_line_blocking(prompt: &str) -> io::Result<Option<String>> {
    let raw = RawMode::enable()?;
    let mut editor = LineEditor::default();
    render(prompt, &editor)?;

    let answer = loop {
        match event::read()? {
            Event::Key(key) => match editor.handle_key(key) {
                Edit::Continue => {}
                Edit::Submit(line) => break Some(line),
                Edit::Interrupt | Edit::EndOfInput => break None,
            },
            Event::Paste(text) => editor.insert_str(&text),
            _ => continue,
        }
        render(prompt, &editor)?;
    };

    drop(raw);
    finish_line()?;
    Ok(answer)
}
