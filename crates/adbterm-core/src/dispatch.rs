// ── Command dispatch ──
//
// Executes a classified prompt line. Every device failure ends up as a
// printed diagnostic; only `.quit` ends the loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use adbterm_api::AndroidKey;

use crate::command::ParsedCommand;
use crate::device::DeviceControl;
use crate::error::CoreError;
use crate::install::{self, BundleLookup, InstallOutcome, PackageInstaller};
use crate::operator::{Notice, Operator};
use crate::session::Session;

/// Default transfer directory on the device.
pub const DEFAULT_DEVICE_DOWNLOADS: &str = "/storage/emulated/0/Download/";

/// Paths the dispatcher works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Root searched for `.install <name>`.
    pub search_root: PathBuf,
    pub device_downloads: String,
    /// Local destination of `.pull`.
    pub local_downloads: PathBuf,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            search_root: PathBuf::from("."),
            device_downloads: DEFAULT_DEVICE_DOWNLOADS.to_owned(),
            local_downloads: PathBuf::from("downloads"),
        }
    }
}

/// What the prompt loop should do with a command's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayResult {
    Silent,
    Notice(Notice),
    Quit,
}

/// Join a device directory and a file name with exactly one `/`.
fn remote_join(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if dir.is_empty() {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Last path segment of `path`, for both local and device paths.
fn base_name(path: &str) -> &str {
    path.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(path)
}

pub struct CommandDispatcher {
    device: Arc<dyn DeviceControl>,
    installer: PackageInstaller,
    operator: Arc<dyn Operator>,
    settings: DispatchSettings,
}

impl CommandDispatcher {
    pub fn new(
        device: Arc<dyn DeviceControl>,
        installer: PackageInstaller,
        operator: Arc<dyn Operator>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            device,
            installer,
            operator,
            settings,
        }
    }

    /// Execute `command`. Errors are folded into a failure notice; an
    /// interrupted prompt is silent.
    pub async fn execute(&self, command: ParsedCommand, session: &Session) -> DisplayResult {
        debug!(?command, "dispatch");
        match self.run(command, session).await {
            Ok(result) => result,
            Err(CoreError::Interrupted) => DisplayResult::Silent,
            Err(e) => {
                warn!(error = %e, "command failed");
                DisplayResult::Notice(Notice::failure(e.to_string()))
            }
        }
    }

    async fn run(
        &self,
        command: ParsedCommand,
        session: &Session,
    ) -> Result<DisplayResult, CoreError> {
        match command {
            ParsedCommand::Empty => self.key(AndroidKey::Enter).await,
            ParsedCommand::Quit => Ok(DisplayResult::Quit),
            ParsedCommand::PowerOn => self.key(AndroidKey::Power).await,
            ParsedCommand::PowerOff => self.key(AndroidKey::EndCall).await,
            ParsedCommand::DisableDevOptions => self.disable_dev_options().await,
            ParsedCommand::ListDevices => self.list_devices().await,
            ParsedCommand::SetPassword(password) => self.set_password(&password).await,
            ParsedCommand::Install(name) => Ok(self.install(&name, session).await),
            ParsedCommand::Push(path) => self.push(&path).await,
            ParsedCommand::Pull(path) => self.pull(&path).await,
            ParsedCommand::RawText(text) => {
                self.type_line(&text).await?;
                Ok(DisplayResult::Silent)
            }
        }
    }

    async fn key(&self, key: AndroidKey) -> Result<DisplayResult, CoreError> {
        self.device.send_keys(&[key], false).await?;
        Ok(DisplayResult::Silent)
    }

    /// Text input followed by enter.
    async fn type_line(&self, text: &str) -> Result<(), CoreError> {
        self.device.send_text(text).await?;
        self.device.send_keys(&[AndroidKey::Enter], false).await
    }

    async fn disable_dev_options(&self) -> Result<DisplayResult, CoreError> {
        let out = self
            .device
            .run_shell(&[
                "settings",
                "put",
                "global",
                "development_settings_enabled",
                "0",
            ])
            .await?;
        let notice = if out.success {
            Notice::plain("-> dev options are disabled")
        } else {
            Notice::failure(format!("cannot disable dev options ({})", out.diagnostic()))
        };
        Ok(DisplayResult::Notice(notice))
    }

    async fn list_devices(&self) -> Result<DisplayResult, CoreError> {
        let devices = self.device.linked_devices().await?;
        if devices.is_empty() {
            return Ok(DisplayResult::Notice(Notice::warning("no linked device")));
        }
        for device in &devices {
            self.operator.notify(&Notice::plain(device.as_str()));
        }
        Ok(DisplayResult::Silent)
    }

    async fn set_password(&self, password: &str) -> Result<DisplayResult, CoreError> {
        // Termux `passwd` asks for the new password twice.
        for line in ["passwd", password, password] {
            self.type_line(line).await?;
        }
        Ok(DisplayResult::Notice(Notice::info("password set")))
    }

    async fn install(&self, name: &str, session: &Session) -> DisplayResult {
        let bundle = match install::locate_bundle(name, &self.settings.search_root) {
            BundleLookup::Found(path) => path,
            BundleLookup::NotAFile => {
                return DisplayResult::Notice(Notice::warning(format!("{name} is not a file")));
            }
            BundleLookup::Unsupported(ext) => {
                return DisplayResult::Notice(Notice::warning(format!(
                    ".{ext} files are not supported"
                )));
            }
            BundleLookup::NotFound => {
                return DisplayResult::Notice(Notice::warning(format!("apk '{name}' not found")));
            }
        };

        let label = install::display_name(&bundle);
        self.operator.notify(&Notice::info(format!(
            "installing '{label}' on {}",
            session.endpoint().ip
        )));

        let notice = match self.installer.install(&bundle).await {
            InstallOutcome::Installed { elapsed, .. } => Notice::success(format!(
                "apk '{label}' installed in {:.1}s",
                elapsed.as_secs_f64()
            )),
            InstallOutcome::Aborted => Notice::warning("install apk aborted"),
            InstallOutcome::Cancelled => Notice::failure("install apk cancelled"),
            InstallOutcome::Failed { reason } => {
                Notice::failure(format!("install apk failed ({reason})"))
            }
        };
        DisplayResult::Notice(notice)
    }

    /// Ask for a device directory, `None` when the operator interrupted.
    fn device_dir(&self, prompt: &str) -> Result<Option<String>, CoreError> {
        let answer = match self.operator.input(prompt) {
            Ok(answer) => answer,
            Err(CoreError::Interrupted) => None,
            Err(e) => return Err(e),
        };
        Ok(answer.map(|dir| {
            let dir = dir.trim();
            if dir.is_empty() {
                self.settings.device_downloads.clone()
            } else {
                dir.to_owned()
            }
        }))
    }

    async fn push(&self, source: &str) -> Result<DisplayResult, CoreError> {
        let local = Path::new(source);
        if !local.exists() {
            return Ok(DisplayResult::Notice(Notice::warning(format!(
                "the path {source} don't exists, cannot push this"
            ))));
        }

        self.operator.notify(&Notice::info(format!(
            "By default, push path to \"{}\"",
            self.settings.device_downloads
        )));
        let Some(dir) = self.device_dir("New target path (empty=default)")? else {
            return Ok(DisplayResult::Silent);
        };
        let target = remote_join(&dir, base_name(source));

        self.operator
            .notify(&Notice::info(format!("pushing '{source}' to the device")));
        let notice = match self.device.push(local, &target).await {
            Ok(()) => Notice::success(format!("path pushed to \"{target}\"")),
            Err(e) => {
                debug!(error = %e, "push failed");
                Notice::failure("push of path failed")
            }
        };
        Ok(DisplayResult::Notice(notice))
    }

    async fn pull(&self, path: &str) -> Result<DisplayResult, CoreError> {
        self.operator.notify(&Notice::info(format!(
            "By default, path are pulled from \"{}\"",
            self.settings.device_downloads
        )));
        let Some(dir) = self.device_dir("New source path (empty=default)")? else {
            return Ok(DisplayResult::Silent);
        };
        let source = remote_join(&dir, path);
        let destination = self.settings.local_downloads.join(base_name(path));
        tokio::fs::create_dir_all(&self.settings.local_downloads).await?;

        self.operator
            .notify(&Notice::info(format!("pulling '{source}' from the device")));
        let notice = match self.device.pull(&source, &destination).await {
            Ok(()) => Notice::success(format!("path pulled to {}", destination.display())),
            Err(e) => {
                debug!(error = %e, "pull failed");
                Notice::failure("pull of path failed")
            }
        };
        Ok(DisplayResult::Notice(notice))
    }
}
