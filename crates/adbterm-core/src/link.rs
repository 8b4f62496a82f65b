// ── Startup link workflow ──
//
// Runs in the foreground before the prompt loop: pair a new device when
// there is no session record, then retry until the endpoint shows up in
// the link membership list. Every endpoint change is persisted through
// the session.

use std::sync::Arc;

use tracing::{debug, info};

use crate::device::DeviceControl;
use crate::error::CoreError;
use crate::operator::{Notice, Operator};
use crate::session::{ConnectivityState, Endpoint, Session, SessionStore};

/// Port of the membership entry matching `endpoint`: exactly `ip:port`
/// when the port is known, any `ip:<p>` otherwise.
pub fn find_linked_port(linked: &[String], endpoint: &Endpoint) -> Option<String> {
    linked.iter().find_map(|entry| {
        let port = entry
            .strip_prefix(endpoint.ip.as_str())?
            .strip_prefix(':')?;
        match &endpoint.port {
            Some(known) => (known == port).then(|| port.to_owned()),
            None => Some(port.to_owned()),
        }
    })
}

pub struct LinkSetup {
    device: Arc<dyn DeviceControl>,
    operator: Arc<dyn Operator>,
}

impl LinkSetup {
    pub fn new(device: Arc<dyn DeviceControl>, operator: Arc<dyn Operator>) -> Self {
        Self { device, operator }
    }

    /// Ask for pairing details, persist the new endpoint (without a
    /// connect port) and pair with the device.
    pub async fn pair(&self, store: &dyn SessionStore) -> Result<Endpoint, CoreError> {
        self.operator.notify(&Notice::info("pairing new device"));
        let ip = self.ask_required("device ip")?;
        let pair_port = self.ask_required("pair port")?;
        let code = self.ask_required("pair code")?;

        let endpoint = Endpoint::new(ip, None);
        store.save(&endpoint)?;

        if let Err(e) = self.device.pair(&endpoint.ip, &pair_port, &code).await {
            self.operator
                .notify(&Notice::failure("pair of new device failed !"));
            return Err(e);
        }
        info!(ip = %endpoint.ip, "device paired");
        self.operator.notify(&Notice::success("device paired"));
        Ok(endpoint)
    }

    /// Loop until the session endpoint is linked, asking the operator for
    /// new details after each failed round.
    ///
    /// Seeds the session as connected. Must run before the connection
    /// monitor is spawned, which owns connectivity from then on.
    pub async fn connect(&self, session: &Session) -> Result<(), CoreError> {
        loop {
            let ip = session.endpoint().ip.clone();
            self.operator
                .notify(&Notice::plain(format!("Searching device {ip}")));

            let reachable = self.device.is_reachable(&ip).await;
            if reachable {
                self.operator.notify(&Notice::info("connecting to device"));
                if self.link(session).await? {
                    break;
                }
            } else {
                self.operator.notify(&Notice::warning("device not found"));
            }

            let mut endpoint = (*session.endpoint()).clone();
            if endpoint.port.is_some() {
                self.operator.notify(&Notice::failure("connect device failed"));
            }
            self.operator.notify(&Notice::info("input device infos :"));
            if !reachable {
                if let Some(ip) = self.ask_keep("device ip", Some(&endpoint.ip))? {
                    endpoint.ip = ip;
                }
            }
            if let Some(port) = self.ask_keep("connect port", endpoint.port.as_deref())? {
                endpoint.port = Some(port);
            }
            session.set_endpoint(endpoint)?;
        }

        info!(endpoint = %session.endpoint(), "device connected");
        self.operator.notify(&Notice::success("device connected"));
        session.set_connectivity(ConnectivityState::Connected);
        Ok(())
    }

    /// One connect attempt against a reachable device.
    async fn link(&self, session: &Session) -> Result<bool, CoreError> {
        let endpoint = session.endpoint();
        if let Some(port) = find_linked_port(&self.linked().await, &endpoint) {
            if endpoint.port.as_deref() != Some(port.as_str()) {
                session.set_endpoint(Endpoint::new(endpoint.ip.clone(), Some(port)))?;
            }
            return Ok(true);
        }

        let port = if let Some(port) = &endpoint.port {
            port.clone()
        } else {
            let port = self.ask_required("connect port")?;
            session.set_endpoint(Endpoint::new(endpoint.ip.clone(), Some(port.clone())))?;
            port
        };

        if let Err(e) = self.device.connect(&endpoint.ip, &port).await {
            debug!(error = %e, "connect attempt failed");
            return Ok(false);
        }
        Ok(find_linked_port(&self.linked().await, &session.endpoint()).is_some())
    }

    async fn linked(&self) -> Vec<String> {
        self.device.linked_devices().await.unwrap_or_else(|e| {
            debug!(error = %e, "membership list unavailable");
            Vec::new()
        })
    }

    fn ask_required(&self, label: &str) -> Result<String, CoreError> {
        loop {
            let answer = self.operator.input(label)?.ok_or(CoreError::Interrupted)?;
            let answer = answer.trim();
            if !answer.is_empty() {
                return Ok(answer.to_owned());
            }
        }
    }

    /// `None` keeps the current value.
    fn ask_keep(&self, label: &str, current: Option<&str>) -> Result<Option<String>, CoreError> {
        let prompt = match current {
            Some(current) => format!("{label} (empty={current})"),
            None => label.to_owned(),
        };
        let answer = self
            .operator
            .input(&prompt)?
            .ok_or(CoreError::Interrupted)?;
        let answer = answer.trim();
        Ok((!answer.is_empty()).then(|| answer.to_owned()))
    }
}
