// ── Prompt read gate ──
//
// Tracks the single outstanding foreground read. The connection monitor
// uses it to cancel that read on a disconnect edge and to wait until the
// read has actually unwound before it reports the disconnect.

use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Registry of the foreground's current read, if any.
///
/// `None` means no read is outstanding. A read is registered with
/// [`begin`](Self::begin) and deregistered when its [`ReadTicket`] drops,
/// so an unwinding read always clears the gate.
pub struct ReadGate {
    state: watch::Sender<Option<CancellationToken>>,
}

impl ReadGate {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self { state }
    }

    /// Register a new read. Only one read may be outstanding at a time;
    /// a previous registration is replaced.
    pub fn begin(&self) -> ReadTicket<'_> {
        let token = CancellationToken::new();
        self.state.send_replace(Some(token.clone()));
        ReadTicket { gate: self, token }
    }

    pub fn is_reading(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Cancel the outstanding read and wait up to `timeout` for it to
    /// unwind.
    ///
    /// Returns `true` when no read is outstanding on return (including
    /// when none was to begin with), `false` if the read did not confirm
    /// in time.
    pub async fn cancel_and_wait(&self, timeout: Duration) -> bool {
        let mut rx = self.state.subscribe();
        let pending = rx.borrow_and_update().clone();
        let Some(token) = pending else {
            return true;
        };
        token.cancel();
        tokio::time::timeout(timeout, rx.wait_for(Option::is_none))
            .await
            .is_ok_and(|r| r.is_ok())
    }
}

/// Handle on a registered read. Carries the read's cancellation token and
/// clears the gate on drop.
pub struct ReadTicket<'a> {
    gate: &'a ReadGate,
    token: CancellationToken,
}

impl ReadTicket<'_> {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for ReadTicket<'_> {
    fn drop(&mut self) {
        self.gate.state.send_replace(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn idle_gate_confirms_immediately() {
        let gate = ReadGate::new();
        assert!(gate.cancel_and_wait(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn ticket_drop_clears_gate() {
        let gate = ReadGate::new();
        {
            let ticket = gate.begin();
            assert!(gate.is_reading());
            assert!(!ticket.token().is_cancelled());
        }
        assert!(!gate.is_reading());
    }

    #[tokio::test]
    async fn wait_completes_when_ticket_drops() {
        let gate = ReadGate::new();
        let ticket = gate.begin();
        let mut wait = tokio_test::task::spawn(gate.cancel_and_wait(Duration::from_secs(5)));

        tokio_test::assert_pending!(wait.poll());
        assert!(ticket.token().is_cancelled());

        drop(ticket);
        assert!(wait.is_woken());
        assert!(tokio_test::assert_ready!(wait.poll()));
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_read_times_out() {
        let gate = ReadGate::new();
        let ticket = gate.begin();
        assert!(!gate.cancel_and_wait(Duration::from_millis(200)).await);
        assert!(ticket.token().is_cancelled());
    }
}
