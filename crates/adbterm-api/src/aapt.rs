//! Package metadata through `aapt dump badging`.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Error;
use crate::process;

/// Handle on the `aapt` executable from the Android build-tools.
#[derive(Debug, Clone)]
pub struct Aapt {
    aapt: PathBuf,
}

impl Aapt {
    pub fn new(aapt: impl Into<PathBuf>) -> Self {
        Self { aapt: aapt.into() }
    }

    /// Read the package id (`com.example.app`) declared by an `.apk`.
    pub async fn package_id(&self, apk: &Path) -> Result<String, Error> {
        debug!(apk = %apk.display(), "exec aapt dump badging");
        let args = [OsStr::new("dump"), OsStr::new("badging"), apk.as_os_str()];
        let out = process::run(&self.aapt, args).await?;
        if !out.success {
            return Err(Error::Badging {
                detail: out.diagnostic().to_owned(),
            });
        }
        parse_package_name(&out.stdout).ok_or_else(|| Error::Badging {
            detail: "no `package: name=` line".into(),
        })
    }
}

/// Pull the package name out of the `package: name='...'` badging line.
pub fn parse_package_name(badging: &str) -> Option<String> {
    let rest = badging.split_once("package: name='")?.1;
    let (name, _) = rest.split_once('\'')?;
    (!name.is_empty()).then(|| name.to_owned())
}
