// ── Interactive prompt loop ──
//
// Foreground half of the session: suspends while the link is down, reads
// one line at a time through a cancellable prompt and feeds it to the
// dispatcher.

use std::sync::Arc;

use tracing::{debug, info, warn};

use adbterm_api::AndroidKey;

use crate::command::ParsedCommand;
use crate::device::DeviceControl;
use crate::dispatch::{CommandDispatcher, DisplayResult};
use crate::error::CoreError;
use crate::operator::{LineReader, Notice, Operator, ReadOutcome};
use crate::session::Session;

pub const PROMPT: &str = "adb-term> ";

pub struct InteractiveSession<R> {
    session: Session,
    dispatcher: CommandDispatcher,
    device: Arc<dyn DeviceControl>,
    operator: Arc<dyn Operator>,
    reader: R,
}

impl<R: LineReader> InteractiveSession<R> {
    pub fn new(
        session: Session,
        dispatcher: CommandDispatcher,
        device: Arc<dyn DeviceControl>,
        operator: Arc<dyn Operator>,
        reader: R,
    ) -> Self {
        Self {
            session,
            dispatcher,
            device,
            operator,
            reader,
        }
    }

    /// Run until `.quit`, end of input or the exit signal. Only a failing
    /// terminal ends the loop with an error.
    pub async fn run(&mut self) -> Result<(), CoreError> {
        loop {
            if self.session.is_exiting() {
                break;
            }
            if !self.session.is_connected() && !self.wait_for_link().await {
                break;
            }

            match self.read().await? {
                ReadOutcome::Cancelled => {
                    debug!("prompt read cancelled");
                }
                ReadOutcome::Interrupted => self.forward_interrupt().await,
                ReadOutcome::EndOfInput => {
                    info!("end of input");
                    self.session.request_exit();
                    break;
                }
                ReadOutcome::Line(line) => {
                    let command = ParsedCommand::classify(line.trim());
                    match self.dispatcher.execute(command, &self.session).await {
                        DisplayResult::Quit => {
                            info!("quit requested");
                            self.session.request_exit();
                            break;
                        }
                        DisplayResult::Notice(notice) => self.operator.notify(&notice),
                        DisplayResult::Silent => {}
                    }
                }
            }
        }
        Ok(())
    }

    /// Block until the monitor reports the link up. `false` when the exit
    /// signal fired first.
    async fn wait_for_link(&self) -> bool {
        self.operator.notify(&Notice::plain(format!(
            "Reconnecting device {}...",
            self.session.endpoint().ip
        )));
        tokio::select! {
            biased;
            () = self.session.exit_token().cancelled() => false,
            () = self.session.wait_connected() => true,
        }
    }

    async fn read(&mut self) -> Result<ReadOutcome, CoreError> {
        let ticket = self.session.gate().begin();
        // Registered before the check: a disconnect landing after this
        // point cancels the ticket instead of being missed.
        if !self.session.is_connected() {
            return Ok(ReadOutcome::Cancelled);
        }
        tokio::select! {
            biased;
            () = self.session.exit_token().cancelled() => Ok(ReadOutcome::Cancelled),
            outcome = self.reader.read_line(PROMPT, ticket.token()) => outcome,
        }
    }

    async fn forward_interrupt(&self) {
        match self
            .device
            .send_keys(&[AndroidKey::CtrlRight, AndroidKey::C], true)
            .await
        {
            Ok(()) => self.operator.notify(&Notice::plain(
                "KeyboardInterrupt -> [Ctrl-c] send to device",
            )),
            Err(e) => {
                warn!(error = %e, "cannot forward interrupt");
                self.operator.notify(&Notice::failure(e.to_string()));
            }
        }
    }
}
