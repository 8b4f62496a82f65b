//! Host reachability through the system `ping` tool.

use std::path::Path;

use tracing::debug;

use crate::process;

/// Two echo requests with a short per-reply deadline, in the flag dialect
/// of the host platform.
fn ping_args(host: &str) -> Vec<&str> {
    if cfg!(windows) {
        vec!["-n", "2", "-w", "550", host]
    } else if cfg!(target_os = "macos") {
        vec!["-c", "2", "-W", "550", host]
    } else {
        vec!["-c", "2", "-W", "1", host]
    }
}

/// Whether `host` answers ping on the local network. Any failure to run
/// `ping` counts as unreachable.
pub async fn is_reachable(host: &str) -> bool {
    match process::run(Path::new("ping"), ping_args(host)).await {
        Ok(out) => out.success,
        Err(e) => {
            debug!(error = %e, host, "ping could not run");
            false
        }
    }
}
