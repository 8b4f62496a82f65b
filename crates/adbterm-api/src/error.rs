use thiserror::Error;

/// Errors raised while driving the platform tools.
///
/// A tool that runs and exits non-zero is *not* an error at this layer:
/// it comes back as a [`CommandOutput`](crate::CommandOutput) with
/// `success == false`. These variants cover the cases where no meaningful
/// output exists at all.
#[derive(Debug, Error)]
pub enum Error {
    /// The tool binary could not be launched (missing, not executable, ...).
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The bundle is not a readable zip container.
    #[error("malformed archive {path}: {source}")]
    Archive {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },

    /// Only `.apk` files can be handed to `adb install`.
    #[error("unsupported unit format '.{extension}' for {path}")]
    UnsupportedUnit { path: String, extension: String },

    #[error("a key combination needs at least two keys, got {count}")]
    InvalidKeyCombination { count: usize },

    /// `aapt dump badging` did not report a package name.
    #[error("package id not found in aapt output: {detail}")]
    Badging { detail: String },
}
