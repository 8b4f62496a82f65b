// ── Connection monitor ──
//
// Background task polling link membership of the session endpoint at a
// fixed cadence. It is the only writer of connectivity after startup.
// On a disconnect edge it cancels the outstanding prompt read and waits
// (bounded) for the read to unwind before reporting.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::device::DeviceControl;
use crate::operator::{Notice, Operator};
use crate::session::{ConnectivityState, Session};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Upper bound on the wait for a cancelled read to unwind.
pub const READ_UNWIND_TIMEOUT: Duration = Duration::from_secs(2);

pub struct ConnectionMonitor {
    device: Arc<dyn DeviceControl>,
    session: Session,
    operator: Arc<dyn Operator>,
    poll_interval: Duration,
}

impl ConnectionMonitor {
    pub fn new(
        device: Arc<dyn DeviceControl>,
        session: Session,
        operator: Arc<dyn Operator>,
    ) -> Self {
        Self {
            device,
            session,
            operator,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Poll until the session's exit signal fires. Never fails: a poll
    /// error counts as "not linked" for that iteration.
    pub async fn run(self) {
        let exit = self.session.exit_token().clone();
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut first_poll = true;

        debug!(interval = ?self.poll_interval, "connection monitor started");
        loop {
            tokio::select! {
                biased;
                () = exit.cancelled() => break,
                _ = interval.tick() => {
                    let linked = self.poll().await;
                    self.observe(linked, first_poll).await;
                    first_poll = false;
                }
            }
        }
        debug!("connection monitor stopped");
    }

    async fn poll(&self) -> bool {
        let Some(serial) = self.session.endpoint().serial() else {
            return false;
        };
        match self.device.linked_devices().await {
            Ok(linked) => {
                trace!(%serial, ?linked, "link poll");
                linked.iter().any(|entry| *entry == serial)
            }
            Err(e) => {
                debug!(error = %e, "link poll failed");
                false
            }
        }
    }

    async fn observe(&self, linked: bool, first_poll: bool) {
        let state = if linked {
            ConnectivityState::Connected
        } else {
            ConnectivityState::Disconnected
        };
        if !self.session.set_connectivity(state) {
            return;
        }

        match state {
            ConnectivityState::Connected => {
                info!(endpoint = %self.session.endpoint(), "link up");
                if !first_poll {
                    self.operator.notify(&Notice::success("device reconnected"));
                }
            }
            ConnectivityState::Disconnected => self.on_disconnect().await,
        }
    }

    async fn on_disconnect(&self) {
        info!(endpoint = %self.session.endpoint(), "link lost");
        if !self
            .session
            .gate()
            .cancel_and_wait(READ_UNWIND_TIMEOUT)
            .await
        {
            warn!("prompt read did not unwind after cancellation");
        }
        if !self.session.is_exiting() {
            self.operator.notify(&Notice::warning("device disconnected"));
        }
    }
}
