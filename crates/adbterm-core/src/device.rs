// ── Device control seam ──
//
// The primitive surface the session needs from the device transport,
// plus the adb-backed implementation. Every primitive goes through a
// single async mutex so device calls from the foreground and from the
// monitor never overlap.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use adbterm_api::{Aapt, AdbClient, AndroidKey, CommandOutput, InstallOptions, bundle};

use crate::error::CoreError;
use crate::session::Session;

/// Exit status and output of a device command.
pub type ShellOutput = CommandOutput;

/// Primitive operations against the controlled device.
#[async_trait]
pub trait DeviceControl: Send + Sync {
    async fn is_reachable(&self, address: &str) -> bool;

    /// Link membership list: `address:port` of every attached device.
    async fn linked_devices(&self) -> Result<Vec<String>, CoreError>;

    async fn run_shell(&self, args: &[&str]) -> Result<ShellOutput, CoreError>;

    async fn send_text(&self, text: &str) -> Result<(), CoreError>;

    async fn send_keys(&self, keys: &[AndroidKey], combination: bool) -> Result<(), CoreError>;

    async fn push(&self, src: &Path, dst: &str) -> Result<(), CoreError>;

    async fn pull(&self, src: &str, dst: &Path) -> Result<(), CoreError>;

    /// Install primitive units. A rejected install is `Ok` with
    /// `success == false` so the caller can inspect the diagnostic.
    async fn install(
        &self,
        units: &[PathBuf],
        replace: bool,
        allow_downgrade: bool,
    ) -> Result<ShellOutput, CoreError>;

    async fn installed_packages(&self) -> Result<Vec<String>, CoreError>;

    async fn connect(&self, address: &str, port: &str) -> Result<(), CoreError>;

    async fn pair(&self, address: &str, port: &str, code: &str) -> Result<(), CoreError>;
}

/// Bundle expansion and package metadata.
#[async_trait]
pub trait PackageTools: Send + Sync {
    async fn extract_units(&self, bundle: &Path) -> Result<Vec<PathBuf>, CoreError>;

    async fn package_id(&self, unit: &Path) -> Result<String, CoreError>;
}

fn check(command: &str, out: &CommandOutput) -> Result<(), CoreError> {
    if out.success {
        Ok(())
    } else {
        Err(CoreError::CommandFailed {
            command: command.into(),
            detail: out.diagnostic().to_owned(),
        })
    }
}

// ── AdbDevice ────────────────────────────────────────────────────

/// [`DeviceControl`] over `adb`, targeting the session's current endpoint.
pub struct AdbDevice {
    client: AdbClient,
    session: Session,
    calls: Mutex<()>,
}

impl AdbDevice {
    pub fn new(client: AdbClient, session: Session) -> Self {
        Self {
            client,
            session,
            calls: Mutex::new(()),
        }
    }

    fn serial(&self) -> Result<String, CoreError> {
        self.session
            .endpoint()
            .serial()
            .ok_or_else(|| CoreError::DeviceUnavailable {
                reason: "no connect port configured".into(),
            })
    }
}

#[async_trait]
impl DeviceControl for AdbDevice {
    async fn is_reachable(&self, address: &str) -> bool {
        adbterm_api::ping::is_reachable(address).await
    }

    async fn linked_devices(&self) -> Result<Vec<String>, CoreError> {
        let _call = self.calls.lock().await;
        Ok(self.client.devices().await?)
    }

    async fn run_shell(&self, args: &[&str]) -> Result<ShellOutput, CoreError> {
        let serial = self.serial()?;
        let _call = self.calls.lock().await;
        Ok(self.client.shell(&serial, args).await?)
    }

    async fn send_text(&self, text: &str) -> Result<(), CoreError> {
        let serial = self.serial()?;
        let _call = self.calls.lock().await;
        let out = self.client.input_text(&serial, text).await?;
        check("input text", &out)
    }

    async fn send_keys(&self, keys: &[AndroidKey], combination: bool) -> Result<(), CoreError> {
        let serial = self.serial()?;
        let _call = self.calls.lock().await;
        let out = self.client.input_keys(&serial, keys, combination).await?;
        check("input keyevent", &out)
    }

    async fn push(&self, src: &Path, dst: &str) -> Result<(), CoreError> {
        let serial = self.serial()?;
        let _call = self.calls.lock().await;
        let out = self.client.push(&serial, src, dst).await?;
        check("push", &out)
    }

    async fn pull(&self, src: &str, dst: &Path) -> Result<(), CoreError> {
        let serial = self.serial()?;
        let _call = self.calls.lock().await;
        let out = self.client.pull(&serial, src, dst).await?;
        check("pull", &out)
    }

    async fn install(
        &self,
        units: &[PathBuf],
        replace: bool,
        allow_downgrade: bool,
    ) -> Result<ShellOutput, CoreError> {
        let serial = self.serial()?;
        let options = InstallOptions {
            replace,
            allow_downgrade,
        };
        let _call = self.calls.lock().await;
        Ok(self.client.install(&serial, units, options).await?)
    }

    async fn installed_packages(&self) -> Result<Vec<String>, CoreError> {
        let serial = self.serial()?;
        let _call = self.calls.lock().await;
        Ok(self.client.list_packages(&serial).await?)
    }

    async fn connect(&self, address: &str, port: &str) -> Result<(), CoreError> {
        let _call = self.calls.lock().await;
        let out = self.client.connect(&format!("{address}:{port}")).await?;
        debug!(stdout = %out.stdout.trim(), "adb connect");
        check("connect", &out)
    }

    async fn pair(&self, address: &str, port: &str, code: &str) -> Result<(), CoreError> {
        let _call = self.calls.lock().await;
        let out = self.client.pair(&format!("{address}:{port}"), code).await?;
        check("pair", &out)
    }
}

// ── AdbPackageTools ──────────────────────────────────────────────

/// [`PackageTools`] over `aapt` and zip extraction.
pub struct AdbPackageTools {
    aapt: Aapt,
    extract_root: PathBuf,
}

impl AdbPackageTools {
    pub fn new(aapt: Aapt, extract_root: PathBuf) -> Self {
        Self { aapt, extract_root }
    }
}

#[async_trait]
impl PackageTools for AdbPackageTools {
    async fn extract_units(&self, bundle: &Path) -> Result<Vec<PathBuf>, CoreError> {
        let bundle = bundle.to_path_buf();
        let root = self.extract_root.clone();
        tokio::task::spawn_blocking(move || bundle::extract_units(&bundle, &root))
            .await
            .map_err(|e| CoreError::Internal(format!("extraction task failed: {e}")))?
            .map_err(CoreError::from)
    }

    async fn package_id(&self, unit: &Path) -> Result<String, CoreError> {
        Ok(self.aapt.package_id(unit).await?)
    }
}
