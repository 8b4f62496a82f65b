// adb client
//
// Builds `adb` argument vectors and parses the handful of outputs the
// session needs (`devices`, `pm list packages`). Device-scoped commands
// take the target serial (`ip:port`) explicitly; the client itself is
// stateless apart from the binary path.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::bundle::{self, BundleKind};
use crate::error::Error;
use crate::keys::AndroidKey;
use crate::process::{self, CommandOutput};

/// Flags for `adb install` / `adb install-multiple`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// `-r`: replace the existing app, keeping its data.
    pub replace: bool,
    /// `-d`: allow a version code downgrade.
    pub allow_downgrade: bool,
}

/// Handle on the `adb` executable.
#[derive(Debug, Clone)]
pub struct AdbClient {
    adb: PathBuf,
}

impl AdbClient {
    pub fn new(adb: impl Into<PathBuf>) -> Self {
        Self { adb: adb.into() }
    }

    async fn exec(&self, args: Vec<OsString>) -> Result<CommandOutput, Error> {
        debug!(?args, "exec adb");
        process::run(&self.adb, args).await
    }

    async fn exec_on(&self, serial: &str, args: Vec<OsString>) -> Result<CommandOutput, Error> {
        let mut full: Vec<OsString> = vec!["-s".into(), serial.into()];
        full.extend(args);
        self.exec(full).await
    }

    // ── Server and link management ────────────────────────────────────

    /// Restart (or start) the local adb server.
    pub async fn restart_server(&self) -> Result<bool, Error> {
        self.exec(vec!["kill-server".into()]).await?;
        Ok(self.exec(vec!["start-server".into()]).await?.success)
    }

    /// Serials of every device currently attached in the `device` state.
    ///
    /// Called on every monitor poll, so it logs at trace level only.
    pub async fn devices(&self) -> Result<Vec<String>, Error> {
        trace!("exec adb devices");
        let out = process::run(&self.adb, ["devices"]).await?;
        Ok(parse_devices(&out.stdout))
    }

    pub async fn connect(&self, endpoint: &str) -> Result<CommandOutput, Error> {
        self.exec(vec!["connect".into(), endpoint.into()]).await
    }

    pub async fn pair(&self, endpoint: &str, code: &str) -> Result<CommandOutput, Error> {
        self.exec(vec!["pair".into(), endpoint.into(), code.into()])
            .await
    }

    // ── Shell and input ───────────────────────────────────────────────

    pub async fn shell(&self, serial: &str, args: &[&str]) -> Result<CommandOutput, Error> {
        let mut full: Vec<OsString> = vec!["shell".into()];
        full.extend(args.iter().map(OsString::from));
        self.exec_on(serial, full).await
    }

    /// Type `text` on the device as if entered on its keyboard.
    pub async fn input_text(&self, serial: &str, text: &str) -> Result<CommandOutput, Error> {
        let quoted = quote_text(text);
        self.shell(serial, &["input", "text", &quoted]).await
    }

    /// Send key events one after another, or pressed together when
    /// `combination` is set.
    pub async fn input_keys(
        &self,
        serial: &str,
        keys: &[AndroidKey],
        combination: bool,
    ) -> Result<CommandOutput, Error> {
        let args = key_args(keys, combination)?;
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        self.shell(serial, &refs).await
    }

    /// Package ids installed on the device. A failed listing yields an
    /// empty list.
    pub async fn list_packages(&self, serial: &str) -> Result<Vec<String>, Error> {
        let out = self.shell(serial, &["pm", "list", "packages"]).await?;
        if !out.success {
            debug!(stderr = %out.stderr.trim(), "pm list packages failed");
            return Ok(Vec::new());
        }
        Ok(parse_packages(&out.stdout))
    }

    // ── Transfers and installs ────────────────────────────────────────

    pub async fn push(&self, serial: &str, src: &Path, dst: &str) -> Result<CommandOutput, Error> {
        self.exec_on(serial, vec!["push".into(), src.into(), dst.into()])
            .await
    }

    pub async fn pull(&self, serial: &str, src: &str, dst: &Path) -> Result<CommandOutput, Error> {
        self.exec_on(serial, vec!["pull".into(), src.into(), dst.into()])
            .await
    }

    pub async fn install(
        &self,
        serial: &str,
        units: &[PathBuf],
        options: InstallOptions,
    ) -> Result<CommandOutput, Error> {
        let args = install_args(units, options)?;
        self.exec_on(serial, args).await
    }
}

// ── Argument builders and parsers ─────────────────────────────────────

/// Build the argument vector for installing `units`.
///
/// A single unit uses `install`, several use `install-multiple`; every
/// unit must be a plain `.apk`.
pub fn install_args(units: &[PathBuf], options: InstallOptions) -> Result<Vec<OsString>, Error> {
    for unit in units {
        if bundle::classify(unit) != BundleKind::Unit {
            return Err(Error::UnsupportedUnit {
                path: unit.display().to_string(),
                extension: bundle::extension_of(unit).unwrap_or_default(),
            });
        }
    }

    let verb = if units.len() > 1 {
        "install-multiple"
    } else {
        "install"
    };
    let mut args: Vec<OsString> = vec![verb.into()];
    if options.replace {
        args.push("-r".into());
    }
    if options.allow_downgrade {
        args.push("-d".into());
    }
    args.extend(units.iter().map(OsString::from));
    Ok(args)
}

fn key_args(keys: &[AndroidKey], combination: bool) -> Result<Vec<String>, Error> {
    if combination && keys.len() < 2 {
        return Err(Error::InvalidKeyCombination { count: keys.len() });
    }
    let mode = if combination {
        "keycombination"
    } else {
        "keyevent"
    };
    let mut args = vec!["input".to_owned(), mode.to_owned()];
    args.extend(keys.iter().map(|k| k.as_ref().to_owned()));
    Ok(args)
}

/// Single-quote `text` for the device shell so spaces and metacharacters
/// reach `input text` untouched.
pub fn quote_text(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

/// Extract serials from `adb devices` output, keeping only entries in the
/// `device` state (not `offline` or `unauthorized`).
pub fn parse_devices(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| {
            let (serial, state) = line.split_once('\t')?;
            (state.trim() == "device").then(|| serial.trim().to_owned())
        })
        .collect()
}

/// Extract package ids from `pm list packages` output.
pub fn parse_packages(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.trim().strip_prefix("package:"))
        .map(str::to_owned)
        .collect()
}
