//! `adbterm run` / `adbterm pair`: link setup, then the interactive session.

use std::sync::Arc;

use tracing::{info, warn};

use adbterm_api::{Aapt, AdbClient};
use adbterm_config::{JsonSessionStore, resolve_tools};
use adbterm_core::{
    AdbDevice, AdbPackageTools, CommandDispatcher, ConnectionMonitor, CoreError, DeviceControl,
    Endpoint, InteractiveSession, LinkSetup, Notice, Operator, PackageInstaller, PackageTools,
    Session, SessionStore,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::operator::ConsoleOperator;
use crate::terminal::TerminalReader;

/// Start a session with the saved device, pairing first when there is no
/// saved device or `force_pair` is set.
pub async fn handle(global: &GlobalOpts, force_pair: bool) -> Result<(), CliError> {
    let config = super::load_config(global)?;
    let tools = resolve_tools(&config.tools)?;
    let operator: Arc<dyn Operator> = Arc::new(ConsoleOperator::new(global.color));

    let client = AdbClient::new(&tools.adb);
    operator.notify(&Notice::info("starting adb"));
    if !client.restart_server().await.map_err(CoreError::from)? {
        warn!("adb start-server reported a failure");
    }

    let store = Arc::new(JsonSessionStore::new(adbterm_config::session_path()));
    let saved = if force_pair { None } else { store.load()? };
    let needs_pairing = saved.is_none();

    // Pairing addresses the device explicitly, so the placeholder endpoint
    // is never used for a device call.
    let session = Session::new(
        saved.unwrap_or_else(|| Endpoint::new(String::new(), None)),
        Arc::clone(&store) as Arc<dyn SessionStore>,
    );
    let device: Arc<dyn DeviceControl> = Arc::new(AdbDevice::new(client, session.clone()));
    let link = LinkSetup::new(Arc::clone(&device), Arc::clone(&operator));

    if needs_pairing {
        let endpoint = link.pair(store.as_ref()).await.map_err(|e| match e {
            CoreError::Interrupted => CliError::Interrupted,
            other => CliError::PairFailed {
                reason: other.to_string(),
            },
        })?;
        session.set_endpoint(endpoint)?;
    }

    link.connect(&session).await?;

    let monitor = ConnectionMonitor::new(Arc::clone(&device), session.clone(), Arc::clone(&operator))
        .with_poll_interval(config.poll_interval())
        .spawn();
    let ip = session.endpoint().ip.clone();
    info!(%ip, "session started");
    operator.notify(&Notice::info(format!("session started with {ip}")));

    let on_signal = session.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.request_exit();
        }
    });

    let package_tools: Arc<dyn PackageTools> = Arc::new(AdbPackageTools::new(
        Aapt::new(&tools.aapt),
        config.extract_dir(),
    ));
    let installer = PackageInstaller::new(
        Arc::clone(&device),
        package_tools,
        Arc::clone(&operator),
    );
    let dispatcher = CommandDispatcher::new(
        Arc::clone(&device),
        installer,
        Arc::clone(&operator),
        config.dispatch_settings(),
    );

    let mut interactive = InteractiveSession::new(
        session.clone(),
        dispatcher,
        device,
        operator,
        TerminalReader::new(),
    );
    let result = interactive.run().await;

    session.request_exit();
    if let Err(e) = monitor.await {
        warn!(error = %e, "connection monitor ended abnormally");
    }
    result.map_err(CliError::from)
}
