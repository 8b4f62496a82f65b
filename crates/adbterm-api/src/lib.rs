//! Async wrappers around the Android platform tools used by adbterm.
//!
//! Every primitive here is a thin process invocation: the caller gets the
//! captured exit status and output back, and decides what a failure means.
//!
//! - **[`AdbClient`]**: `adb` server control, link membership
//!   (`adb devices`), shell/input commands, file transfer and installs.
//! - **[`Aapt`]**: reads the package id of an `.apk` via `aapt dump badging`.
//! - **[`bundle`]**: expands `.apkm` / `.xapk` archives into installable
//!   `.apk` units.
//! - **[`ping`]**: host reachability through the system `ping` tool.

pub mod aapt;
pub mod adb;
pub mod bundle;
pub mod error;
pub mod keys;
pub mod ping;
mod process;

pub use aapt::Aapt;
pub use adb::{AdbClient, InstallOptions};
pub use bundle::{BundleKind, SUPPORTED_EXTENSIONS};
pub use error::Error;
pub use keys::AndroidKey;
pub use process::CommandOutput;
