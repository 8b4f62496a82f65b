// ── Session state ──
//
// The device endpoint and link connectivity shared by the foreground
// prompt loop and the background connection monitor. The endpoint is an
// `ArcSwap` snapshot (copy-on-read for the monitor, written only by the
// foreground); connectivity is a `watch` channel written only by the
// monitor after startup.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::CoreError;
use crate::gate::ReadGate;

// ── ConnectivityState ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Disconnected,
    Connected,
}

// ── Endpoint ─────────────────────────────────────────────────────

/// Network address of the controlled device.
///
/// `port` stays `None` until the first successful connect; an absent port
/// is asked for again on the next startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub ip: String,
    pub port: Option<String>,
}

impl Endpoint {
    pub fn new(ip: impl Into<String>, port: Option<String>) -> Self {
        Self {
            ip: ip.into(),
            port,
        }
    }

    /// The adb serial (`ip:port`), once a port is known.
    pub fn serial(&self) -> Option<String> {
        self.port.as_ref().map(|port| format!("{}:{port}", self.ip))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.port {
            Some(port) => write!(f, "{}:{port}", self.ip),
            None => f.write_str(&self.ip),
        }
    }
}

// ── Persistence seam ─────────────────────────────────────────────

/// Durable storage for the endpoint, rewritten after every mutation.
pub trait SessionStore: Send + Sync {
    /// The stored endpoint, or `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Endpoint>, CoreError>;

    fn save(&self, endpoint: &Endpoint) -> Result<(), CoreError>;
}

// ── Session ──────────────────────────────────────────────────────

/// Cheaply cloneable handle on the shared session state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    endpoint: ArcSwap<Endpoint>,
    connectivity: watch::Sender<ConnectivityState>,
    gate: ReadGate,
    /// Process-wide exit signal.
    exit: CancellationToken,
    store: Arc<dyn SessionStore>,
}

impl Session {
    /// Create a session for `endpoint`. Starts out disconnected.
    pub fn new(endpoint: Endpoint, store: Arc<dyn SessionStore>) -> Self {
        let (connectivity, _) = watch::channel(ConnectivityState::Disconnected);
        Self {
            inner: Arc::new(SessionInner {
                endpoint: ArcSwap::from_pointee(endpoint),
                connectivity,
                gate: ReadGate::new(),
                exit: CancellationToken::new(),
                store,
            }),
        }
    }

    // ── Endpoint ─────────────────────────────────────────────────

    /// Snapshot of the current endpoint.
    pub fn endpoint(&self) -> Arc<Endpoint> {
        self.inner.endpoint.load_full()
    }

    /// Replace the endpoint and persist it.
    pub fn set_endpoint(&self, endpoint: Endpoint) -> Result<(), CoreError> {
        debug!(%endpoint, "session endpoint updated");
        let endpoint = Arc::new(endpoint);
        self.inner.endpoint.store(Arc::clone(&endpoint));
        self.inner.store.save(&endpoint)
    }

    // ── Connectivity ─────────────────────────────────────────────

    pub fn connectivity(&self) -> ConnectivityState {
        *self.inner.connectivity.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.connectivity() == ConnectivityState::Connected
    }

    /// Record a link state. Returns `true` when the state changed.
    ///
    /// The connection monitor is the only caller once the prompt loop is
    /// running. The one other write is the startup link workflow seeding
    /// `Connected` before the monitor is spawned, so the monitor's first
    /// poll finds no edge to report.
    pub(crate) fn set_connectivity(&self, state: ConnectivityState) -> bool {
        self.inner.connectivity.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.inner.connectivity.subscribe()
    }

    /// Wait until the link is reported connected.
    pub async fn wait_connected(&self) {
        let mut rx = self.subscribe();
        let _ = rx
            .wait_for(|state| *state == ConnectivityState::Connected)
            .await;
    }

    // ── Foreground read and exit ─────────────────────────────────

    pub fn gate(&self) -> &ReadGate {
        &self.inner.gate
    }

    pub fn exit_token(&self) -> &CancellationToken {
        &self.inner.exit
    }

    pub fn request_exit(&self) {
        self.inner.exit.cancel();
    }

    pub fn is_exiting(&self) -> bool {
        self.inner.exit.is_cancelled()
    }
}
