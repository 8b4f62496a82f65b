//! Installable file formats and bundle extraction.
//!
//! `.apk` files are handed to `adb install` directly. `.apkm` and `.xapk`
//! bundles are zip containers holding one base `.apk` plus split units;
//! they are unpacked into a per-bundle directory under an extraction root.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;
use zip::ZipArchive;

use crate::error::Error;

/// Extension of a primitive unit accepted by `adb install`.
pub const UNIT_EXTENSION: &str = "apk";

/// Multi-unit bundle extensions.
pub const BUNDLE_EXTENSIONS: [&str; 2] = ["apkm", "xapk"];

/// Every extension adbterm can install, in lookup order.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = [UNIT_EXTENSION, "apkm", "xapk"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleKind {
    Unit,
    Bundle,
    Unsupported,
}

/// Lower-cased extension of `path`, without the dot.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

pub fn classify(path: &Path) -> BundleKind {
    match extension_of(path).as_deref() {
        Some(UNIT_EXTENSION) => BundleKind::Unit,
        Some(ext) if BUNDLE_EXTENSIONS.contains(&ext) => BundleKind::Bundle,
        _ => BundleKind::Unsupported,
    }
}

/// Unpack `bundle` into `<extract_root>/<bundle stem>/` and return the
/// `.apk` units found at the top of that directory, sorted by name.
///
/// Entries whose names would escape the target directory are skipped.
pub fn extract_units(bundle: &Path, extract_root: &Path) -> Result<Vec<PathBuf>, Error> {
    let stem = bundle
        .file_stem()
        .map_or_else(|| "bundle".into(), |s| s.to_string_lossy().into_owned());
    let target = extract_root.join(stem);
    fs::create_dir_all(&target)?;
    info!(bundle = %bundle.display(), target = %target.display(), "extracting bundle");

    let archive_err = |source| Error::Archive {
        path: bundle.display().to_string(),
        source,
    };
    let mut archive = ZipArchive::new(File::open(bundle)?).map_err(archive_err)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(archive_err)?;
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let out_path = target.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
    }

    let mut units: Vec<PathBuf> = fs::read_dir(&target)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && classify(p) == BundleKind::Unit)
        .collect();
    units.sort();
    Ok(units)
}
