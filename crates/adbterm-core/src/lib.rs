//! Session logic between `adbterm-api` and the terminal front end.
//!
//! This crate owns the control session for one remote Android device:
//!
//! - **[`Session`]**: Shared handle on the device endpoint (persisted
//!   through a [`SessionStore`] on every change), the connectivity state
//!   and the process-wide exit signal.
//!
//! - **[`ConnectionMonitor`]**: Background task polling link membership.
//!   On a disconnect edge it cancels the pending prompt read through the
//!   session's [`ReadGate`] and waits for it to unwind before reporting.
//!
//! - **[`InteractiveSession`]**: Foreground prompt loop. Suspends while
//!   the link is down and resumes reading once the monitor reports it up.
//!
//! - **[`CommandDispatcher`]**: Executes a [`ParsedCommand`]: key events,
//!   text input, file transfer, installs.
//!
//! - **[`PackageInstaller`]**: Extract, identify, conflict-check, install,
//!   and the operator-confirmed downgrade retry.
//!
//! - **[`LinkSetup`]**: Startup pairing and connect loop.
//!
//! Device I/O goes through [`DeviceControl`] / [`PackageTools`], operator
//! I/O through [`Operator`] / [`LineReader`].

pub mod command;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod gate;
pub mod install;
pub mod interactive;
pub mod link;
pub mod monitor;
pub mod operator;
pub mod session;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::ParsedCommand;
pub use device::{AdbDevice, AdbPackageTools, DeviceControl, PackageTools, ShellOutput};
pub use dispatch::{CommandDispatcher, DispatchSettings, DisplayResult};
pub use error::CoreError;
pub use gate::{ReadGate, ReadTicket};
pub use install::{InstallOutcome, InstallRequest, PackageInstaller};
pub use interactive::{InteractiveSession, PROMPT};
pub use link::LinkSetup;
pub use monitor::ConnectionMonitor;
pub use operator::{LineReader, Notice, NoticeLevel, Operator, ReadOutcome};
pub use session::{ConnectivityState, Endpoint, Session, SessionStore};
