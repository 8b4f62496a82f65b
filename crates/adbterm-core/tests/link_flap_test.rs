//! Monitor and prompt loop running together against a flapping link.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use adbterm_api::AndroidKey;
use adbterm_core::{
    CommandDispatcher, ConnectionMonitor, CoreError, DeviceControl, DispatchSettings, Endpoint,
    InteractiveSession, LineReader, Notice, Operator, PackageInstaller, PackageTools,
    ReadOutcome, Session, SessionStore, ShellOutput,
};

const SERIAL: &str = "10.0.0.5:5555";

// ── Fakes ────────────────────────────────────────────────────────

struct NullStore;

impl SessionStore for NullStore {
    fn load(&self) -> Result<Option<Endpoint>, CoreError> {
        Ok(None)
    }

    fn save(&self, _endpoint: &Endpoint) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Link membership follows `up`; everything else succeeds.
#[derive(Default)]
struct Link {
    up: AtomicBool,
    texts: Mutex<Vec<String>>,
}

#[async_trait]
impl DeviceControl for Link {
    async fn is_reachable(&self, _address: &str) -> bool {
        true
    }

    async fn linked_devices(&self) -> Result<Vec<String>, CoreError> {
        Ok(if self.up.load(Ordering::SeqCst) {
            vec![SERIAL.to_owned()]
        } else {
            Vec::new()
        })
    }

    async fn run_shell(&self, _args: &[&str]) -> Result<ShellOutput, CoreError> {
        Ok(ShellOutput {
            success: true,
            stdout: String::new(),
            stderr: String::new(),
        })
    }

    async fn send_text(&self, text: &str) -> Result<(), CoreError> {
        self.texts.lock().expect("lock").push(text.to_owned());
        Ok(())
    }

    async fn send_keys(&self, _keys: &[AndroidKey], _combination: bool) -> Result<(), CoreError> {
        Ok(())
    }

    async fn push(&self, _src: &Path, _dst: &str) -> Result<(), CoreError> {
        Ok(())
    }

    async fn pull(&self, _src: &str, _dst: &Path) -> Result<(), CoreError> {
        Ok(())
    }

    async fn install(
        &self,
        _units: &[PathBuf],
        _replace: bool,
        _allow_downgrade: bool,
    ) -> Result<ShellOutput, CoreError> {
        self.run_shell(&[]).await
    }

    async fn installed_packages(&self) -> Result<Vec<String>, CoreError> {
        Ok(Vec::new())
    }

    async fn connect(&self, _address: &str, _port: &str) -> Result<(), CoreError> {
        Ok(())
    }

    async fn pair(&self, _address: &str, _port: &str, _code: &str) -> Result<(), CoreError> {
        Ok(())
    }
}

struct NoTools;

#[async_trait]
impl PackageTools for NoTools {
    async fn extract_units(&self, _bundle: &Path) -> Result<Vec<PathBuf>, CoreError> {
        Ok(Vec::new())
    }

    async fn package_id(&self, _unit: &Path) -> Result<String, CoreError> {
        Err(CoreError::Metadata {
            message: "unused".into(),
        })
    }
}

#[derive(Default)]
struct Transcript(Mutex<Vec<String>>);

impl Transcript {
    fn lines(&self) -> Vec<String> {
        self.0.lock().expect("lock").clone()
    }
}

impl Operator for Transcript {
    fn notify(&self, notice: &Notice) {
        self.0.lock().expect("lock").push(notice.to_string());
    }

    fn confirm(&self, _prompt: &str) -> Result<bool, CoreError> {
        Ok(false)
    }

    fn input(&self, _prompt: &str) -> Result<Option<String>, CoreError> {
        Ok(None)
    }
}

/// First read blocks until cancelled, the next types a line, then quits.
struct Reader {
    reads: Arc<AtomicUsize>,
    cancelled: Arc<AtomicUsize>,
    transcript: Arc<Transcript>,
}

#[async_trait]
impl LineReader for Reader {
    async fn read_line(
        &mut self,
        _prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<ReadOutcome, CoreError> {
        match self.reads.fetch_add(1, Ordering::SeqCst) {
            0 => {
                cancel.cancelled().await;
                self.cancelled.fetch_add(1, Ordering::SeqCst);
                self.transcript.notify(&Notice::plain("<read cancelled>"));
                Ok(ReadOutcome::Cancelled)
            }
            1 => Ok(ReadOutcome::Line("whoami".into())),
            _ => Ok(ReadOutcome::Line(".quit".into())),
        }
    }
}

// ── Scenario ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn flapping_link_cancels_one_read_and_resumes() {
    let session = Session::new(
        Endpoint::new("10.0.0.5", Some("5555".into())),
        Arc::new(NullStore),
    );
    let link = Arc::new(Link::default());
    link.up.store(true, Ordering::SeqCst);
    let transcript = Arc::new(Transcript::default());
    let reads = Arc::new(AtomicUsize::new(0));
    let cancelled = Arc::new(AtomicUsize::new(0));

    let monitor = ConnectionMonitor::new(link.clone(), session.clone(), transcript.clone())
        .with_poll_interval(Duration::from_millis(100))
        .spawn();
    session.wait_connected().await;

    let installer = PackageInstaller::new(link.clone(), Arc::new(NoTools), transcript.clone());
    let dispatcher = CommandDispatcher::new(
        link.clone(),
        installer,
        transcript.clone(),
        DispatchSettings::default(),
    );
    let reader = Reader {
        reads: reads.clone(),
        cancelled: cancelled.clone(),
        transcript: transcript.clone(),
    };
    let mut foreground =
        InteractiveSession::new(session.clone(), dispatcher, link.clone(), transcript.clone(), reader);
    let foreground = tokio::spawn(async move { foreground.run().await });

    while reads.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    link.up.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(reads.load(Ordering::SeqCst), 1, "no read while disconnected");

    link.up.store(true, Ordering::SeqCst);
    foreground.await.expect("join").expect("prompt loop");
    monitor.await.expect("monitor");

    assert_eq!(cancelled.load(Ordering::SeqCst), 1);
    assert_eq!(reads.load(Ordering::SeqCst), 3);
    assert_eq!(*link.texts.lock().expect("lock"), ["whoami"]);
    let lines = transcript.lines();
    let position = |line: &str| lines.iter().position(|l| l == line);
    let cancelled_at = position("<read cancelled>").expect("read cancelled");
    let disconnected_at = position("[!] device disconnected").expect("disconnect notice");
    assert!(cancelled_at < disconnected_at);
    assert!(position("Reconnecting device 10.0.0.5...").is_some());
    assert_eq!(lines.last().map(String::as_str), Some("[+] device reconnected"));
}
