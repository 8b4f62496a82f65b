// ── Package install workflow ──
//
// extract → identify → conflict-check → install → downgrade retry.
// The retry is an explicit two-phase protocol: an attempt in the
// `Initial` phase may move to `DowngradeRetry` once, with operator
// consent; any result in `DowngradeRetry` is final.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use adbterm_api::bundle::{self, BundleKind, SUPPORTED_EXTENSIONS};

use crate::device::{DeviceControl, PackageTools};
use crate::error::CoreError;
use crate::operator::{Notice, Operator};

/// Marker `adb install` prints when the device holds a newer version.
pub const DOWNGRADE_MARKER: &str = "INSTALL_FAILED_VERSION_DOWNGRADE";
/// Second marker printed alongside [`DOWNGRADE_MARKER`].
pub const DOWNGRADE_DETECTED_MARKER: &str = "Downgrade detected";

// ── Bundle lookup ────────────────────────────────────────────────

/// Where an `.install <name>` argument points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleLookup {
    Found(PathBuf),
    NotAFile,
    /// An existing file with an extension adbterm cannot install.
    Unsupported(String),
    NotFound,
}

/// Resolve `name` to an installable file.
///
/// An existing path is used directly. Otherwise `search_root` is walked
/// depth-first with entries sorted by file name, and the first file named
/// `name` or `name.<ext>` (for each supported extension) wins.
pub fn locate_bundle(name: &str, search_root: &Path) -> BundleLookup {
    let literal = Path::new(name);
    if literal.exists() {
        if !literal.is_file() {
            return BundleLookup::NotAFile;
        }
        return match bundle::classify(literal) {
            BundleKind::Unsupported => {
                BundleLookup::Unsupported(bundle::extension_of(literal).unwrap_or_default())
            }
            BundleKind::Unit | BundleKind::Bundle => BundleLookup::Found(literal.to_path_buf()),
        };
    }

    let candidates: Vec<String> = std::iter::once(name.to_owned())
        .chain(SUPPORTED_EXTENSIONS.iter().map(|ext| format!("{name}.{ext}")))
        .collect();

    WalkDir::new(search_root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .find(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|file| candidates.iter().any(|c| c == file))
        })
        .map_or(BundleLookup::NotFound, |entry| {
            BundleLookup::Found(entry.into_path())
        })
}

// ── Request / outcome ────────────────────────────────────────────

/// An install being assembled: units are resolved first, flags are set
/// by the conflict check and the downgrade retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub bundle: PathBuf,
    pub units: Vec<PathBuf>,
    pub replace: bool,
    pub allow_downgrade: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed { elapsed: Duration, downgraded: bool },
    /// The package is already installed and the operator declined to
    /// replace it. Nothing was sent to the device.
    Aborted,
    /// The device rejected a downgrade and the operator declined to force it.
    Cancelled,
    Failed { reason: String },
}

/// Result of a single install primitive call.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Attempt {
    Succeeded,
    DowngradeRejected(String),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Initial,
    DowngradeRetry,
}

/// Collapse a multi-line tool diagnostic onto one line.
fn one_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ── PackageInstaller ─────────────────────────────────────────────

pub struct PackageInstaller {
    device: Arc<dyn DeviceControl>,
    tools: Arc<dyn PackageTools>,
    operator: Arc<dyn Operator>,
}

impl PackageInstaller {
    pub fn new(
        device: Arc<dyn DeviceControl>,
        tools: Arc<dyn PackageTools>,
        operator: Arc<dyn Operator>,
    ) -> Self {
        Self {
            device,
            tools,
            operator,
        }
    }

    /// Run the full install protocol for `bundle`.
    pub async fn install(&self, bundle: &Path) -> InstallOutcome {
        let started = Instant::now();

        let units = match self.resolve_units(bundle).await {
            Ok(units) if units.is_empty() => {
                return InstallOutcome::Failed {
                    reason: format!("no .apk unit found in {}", bundle.display()),
                };
            }
            Ok(units) => units,
            Err(e) => {
                return InstallOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };
        let mut request = InstallRequest {
            bundle: bundle.to_path_buf(),
            units,
            replace: false,
            allow_downgrade: false,
        };

        if let Some(package) = self.identify(&request.units).await {
            if self.is_installed(&package).await {
                self.operator
                    .notify(&Notice::warning("This apk is already installed on device"));
                match self
                    .ask("Install the new apk without erasing old apk data (-> apk update) ?")
                {
                    Ok(true) => request.replace = true,
                    Ok(false) => return InstallOutcome::Aborted,
                    Err(reason) => return InstallOutcome::Failed { reason },
                }
            }
        }

        let mut phase = Phase::Initial;
        loop {
            match (self.attempt(&request).await, phase) {
                (Attempt::Succeeded, _) => {
                    let elapsed = started.elapsed();
                    info!(bundle = %request.bundle.display(), ?elapsed, "install succeeded");
                    return InstallOutcome::Installed {
                        elapsed,
                        downgraded: request.allow_downgrade,
                    };
                }
                (Attempt::DowngradeRejected(_), Phase::Initial) => {
                    self.operator.notify(&Notice::warning("Downgrade detected"));
                    match self.ask("Install this old apk version ?") {
                        Ok(true) => {}
                        Ok(false) => return InstallOutcome::Cancelled,
                        Err(reason) => return InstallOutcome::Failed { reason },
                    }
                    request.allow_downgrade = true;
                    phase = Phase::DowngradeRetry;
                    self.operator.notify(&Notice::info(format!(
                        "installing '{}' with downgrade allowed",
                        display_name(&request.bundle)
                    )));
                }
                (Attempt::DowngradeRejected(reason) | Attempt::Failed(reason), _) => {
                    warn!(%reason, "install failed");
                    return InstallOutcome::Failed { reason };
                }
            }
        }
    }

    /// Step 1: the set of primitive units to hand to the device.
    async fn resolve_units(&self, bundle: &Path) -> Result<Vec<PathBuf>, CoreError> {
        match bundle::classify(bundle) {
            BundleKind::Unit => Ok(vec![bundle.to_path_buf()]),
            BundleKind::Bundle => {
                let ext = bundle::extension_of(bundle).unwrap_or_default();
                self.operator.notify(&Notice::info(format!(
                    "extracting .apk files from .{ext} archive ..."
                )));
                self.tools.extract_units(bundle).await
            }
            BundleKind::Unsupported => Err(CoreError::UnsupportedFormat {
                extension: bundle::extension_of(bundle).unwrap_or_default(),
            }),
        }
    }

    /// Step 2: package id of the last unit. `None` disables the conflict
    /// check.
    async fn identify(&self, units: &[PathBuf]) -> Option<String> {
        let unit = units.last()?;
        match self.tools.package_id(unit).await {
            Ok(id) => {
                debug!(package = %id, "identified package");
                Some(id)
            }
            Err(e) => {
                self.operator
                    .notify(&Notice::failure(format!("cannot find apk id ({e})")));
                None
            }
        }
    }

    async fn is_installed(&self, package: &str) -> bool {
        match self.device.installed_packages().await {
            Ok(packages) => packages.iter().any(|p| p == package),
            Err(e) => {
                debug!(error = %e, "installed package list unavailable");
                false
            }
        }
    }

    /// A yes/no question; an interrupted prompt counts as "no".
    fn ask(&self, prompt: &str) -> Result<bool, String> {
        match self.operator.confirm(prompt) {
            Ok(answer) => Ok(answer),
            Err(CoreError::Interrupted) => Ok(false),
            Err(e) => Err(e.to_string()),
        }
    }

    async fn attempt(&self, request: &InstallRequest) -> Attempt {
        debug!(
            units = request.units.len(),
            replace = request.replace,
            downgrade = request.allow_downgrade,
            "install attempt"
        );
        let out = match self
            .device
            .install(&request.units, request.replace, request.allow_downgrade)
            .await
        {
            Ok(out) => out,
            Err(e) => return Attempt::Failed(e.to_string()),
        };
        if out.success {
            return Attempt::Succeeded;
        }

        let combined = format!("{}\n{}", out.stderr, out.stdout);
        let reason = one_line(out.diagnostic());
        if combined.contains(DOWNGRADE_MARKER) && combined.contains(DOWNGRADE_DETECTED_MARKER) {
            Attempt::DowngradeRejected(reason)
        } else {
            Attempt::Failed(reason)
        }
    }
}

/// File name of `path` for progress messages.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
