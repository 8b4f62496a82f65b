// Test doubles for the device, tool, operator and prompt seams.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use adbterm_api::AndroidKey;

use crate::device::{DeviceControl, PackageTools, ShellOutput};
use crate::error::CoreError;
use crate::operator::{LineReader, Notice, Operator, ReadOutcome};
use crate::session::{Endpoint, Session, SessionStore};

pub(crate) fn ok_output(stdout: &str) -> ShellOutput {
    ShellOutput {
        success: true,
        stdout: stdout.into(),
        stderr: String::new(),
    }
}

pub(crate) fn failed_output(stderr: &str) -> ShellOutput {
    ShellOutput {
        success: false,
        stdout: String::new(),
        stderr: stderr.into(),
    }
}

// ── MemoryStore ──────────────────────────────────────────────────

/// In-memory store recording every save.
#[derive(Default)]
pub(crate) struct MemoryStore {
    pub(crate) saved: Mutex<Vec<Endpoint>>,
}

impl MemoryStore {
    pub(crate) fn last(&self) -> Option<Endpoint> {
        self.saved.lock().expect("store lock").last().cloned()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Option<Endpoint>, CoreError> {
        Ok(self.last())
    }

    fn save(&self, endpoint: &Endpoint) -> Result<(), CoreError> {
        self.saved.lock().expect("store lock").push(endpoint.clone());
        Ok(())
    }
}

pub(crate) fn session_for(ip: &str, port: Option<&str>) -> (Session, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let session = Session::new(Endpoint::new(ip, port.map(str::to_owned)), store.clone());
    (session, store)
}

// ── FakeDevice ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Ping(String),
    Links,
    Shell(Vec<String>),
    Text(String),
    Keys(Vec<AndroidKey>, bool),
    Push(PathBuf, String),
    Pull(String, PathBuf),
    Install {
        units: Vec<PathBuf>,
        replace: bool,
        allow_downgrade: bool,
    },
    Packages,
    Connect(String, String),
    Pair(String, String, String),
}

#[derive(Default)]
pub(crate) struct DeviceState {
    pub(crate) calls: Vec<Call>,
    /// Scripted ping answers, then `reachable`.
    pub(crate) pings: VecDeque<bool>,
    pub(crate) reachable: bool,
    /// Scripted membership polls (`None` = transport error), then `linked`.
    pub(crate) polls: VecDeque<Option<Vec<String>>>,
    pub(crate) linked: Vec<String>,
    /// Scripted `run_shell` results, then a successful empty output.
    pub(crate) shells: VecDeque<ShellOutput>,
    /// Scripted `send_text` acknowledgements, then accepted.
    pub(crate) texts: VecDeque<bool>,
    pub(crate) keys_ok: bool,
    pub(crate) installs: VecDeque<ShellOutput>,
    pub(crate) packages: Vec<String>,
    pub(crate) packages_ok: bool,
    pub(crate) connect_ok: bool,
    pub(crate) pair_ok: bool,
    pub(crate) transfer_ok: bool,
}

/// Scripted [`DeviceControl`] recording every call.
pub(crate) struct FakeDevice {
    pub(crate) state: Mutex<DeviceState>,
}

impl FakeDevice {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(DeviceState {
                reachable: true,
                keys_ok: true,
                packages_ok: true,
                connect_ok: true,
                pair_ok: true,
                transfer_ok: true,
                ..DeviceState::default()
            }),
        }
    }

    pub(crate) fn with<F: FnOnce(&mut DeviceState)>(self, setup: F) -> Self {
        setup(&mut self.lock());
        self
    }

    pub(crate) fn lock(&self) -> std::sync::MutexGuard<'_, DeviceState> {
        self.state.lock().expect("device lock")
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub(crate) fn installs(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Install { .. }))
            .collect()
    }

    fn fail(command: &str) -> CoreError {
        CoreError::CommandFailed {
            command: command.into(),
            detail: "scripted failure".into(),
        }
    }
}

#[async_trait]
impl DeviceControl for FakeDevice {
    async fn is_reachable(&self, address: &str) -> bool {
        let mut state = self.lock();
        state.calls.push(Call::Ping(address.into()));
        let fallback = state.reachable;
        state.pings.pop_front().unwrap_or(fallback)
    }

    async fn linked_devices(&self) -> Result<Vec<String>, CoreError> {
        let mut state = self.lock();
        state.calls.push(Call::Links);
        match state.polls.pop_front() {
            Some(Some(links)) => Ok(links),
            Some(None) => Err(CoreError::DeviceUnavailable {
                reason: "scripted poll failure".into(),
            }),
            None => Ok(state.linked.clone()),
        }
    }

    async fn run_shell(&self, args: &[&str]) -> Result<ShellOutput, CoreError> {
        let mut state = self.lock();
        state
            .calls
            .push(Call::Shell(args.iter().map(|a| (*a).to_owned()).collect()));
        Ok(state.shells.pop_front().unwrap_or_else(|| ok_output("")))
    }

    async fn send_text(&self, text: &str) -> Result<(), CoreError> {
        let mut state = self.lock();
        state.calls.push(Call::Text(text.into()));
        if state.texts.pop_front().unwrap_or(true) {
            Ok(())
        } else {
            Err(Self::fail("input text"))
        }
    }

    async fn send_keys(&self, keys: &[AndroidKey], combination: bool) -> Result<(), CoreError> {
        let mut state = self.lock();
        state.calls.push(Call::Keys(keys.to_vec(), combination));
        if state.keys_ok { Ok(()) } else { Err(Self::fail("input keyevent")) }
    }

    async fn push(&self, src: &Path, dst: &str) -> Result<(), CoreError> {
        let mut state = self.lock();
        state.calls.push(Call::Push(src.to_path_buf(), dst.into()));
        if state.transfer_ok { Ok(()) } else { Err(Self::fail("push")) }
    }

    async fn pull(&self, src: &str, dst: &Path) -> Result<(), CoreError> {
        let mut state = self.lock();
        state.calls.push(Call::Pull(src.into(), dst.to_path_buf()));
        if state.transfer_ok { Ok(()) } else { Err(Self::fail("pull")) }
    }

    async fn install(
        &self,
        units: &[PathBuf],
        replace: bool,
        allow_downgrade: bool,
    ) -> Result<ShellOutput, CoreError> {
        let mut state = self.lock();
        state.calls.push(Call::Install {
            units: units.to_vec(),
            replace,
            allow_downgrade,
        });
        Ok(state
            .installs
            .pop_front()
            .unwrap_or_else(|| ok_output("Success")))
    }

    async fn installed_packages(&self) -> Result<Vec<String>, CoreError> {
        let mut state = self.lock();
        state.calls.push(Call::Packages);
        if state.packages_ok {
            Ok(state.packages.clone())
        } else {
            Err(Self::fail("pm list packages"))
        }
    }

    async fn connect(&self, address: &str, port: &str) -> Result<(), CoreError> {
        let mut state = self.lock();
        state.calls.push(Call::Connect(address.into(), port.into()));
        if state.connect_ok {
            state.linked.push(format!("{address}:{port}"));
            Ok(())
        } else {
            Err(Self::fail("connect"))
        }
    }

    async fn pair(&self, address: &str, port: &str, code: &str) -> Result<(), CoreError> {
        let mut state = self.lock();
        state
            .calls
            .push(Call::Pair(address.into(), port.into(), code.into()));
        if state.pair_ok { Ok(()) } else { Err(Self::fail("pair")) }
    }
}

// ── FakeTools ────────────────────────────────────────────────────

/// [`PackageTools`] returning fixed units and package id.
pub(crate) struct FakeTools {
    pub(crate) units: Vec<PathBuf>,
    pub(crate) package: Option<String>,
    pub(crate) identified: Mutex<Vec<PathBuf>>,
}

impl FakeTools {
    pub(crate) fn new(package: Option<&str>) -> Self {
        Self {
            units: Vec::new(),
            package: package.map(str::to_owned),
            identified: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_units(mut self, units: &[&str]) -> Self {
        self.units = units.iter().map(PathBuf::from).collect();
        self
    }
}

#[async_trait]
impl PackageTools for FakeTools {
    async fn extract_units(&self, _bundle: &Path) -> Result<Vec<PathBuf>, CoreError> {
        Ok(self.units.clone())
    }

    async fn package_id(&self, unit: &Path) -> Result<String, CoreError> {
        self.identified
            .lock()
            .expect("tools lock")
            .push(unit.to_path_buf());
        self.package.clone().ok_or_else(|| CoreError::Metadata {
            message: "no package line".into(),
        })
    }
}

// ── RecordingOperator ────────────────────────────────────────────

/// [`Operator`] with scripted answers; `None` answers are interrupts.
#[derive(Default)]
pub(crate) struct RecordingOperator {
    pub(crate) notices: Mutex<Vec<Notice>>,
    pub(crate) questions: Mutex<Vec<String>>,
    pub(crate) confirms: Mutex<VecDeque<Option<bool>>>,
    pub(crate) inputs: Mutex<VecDeque<Option<String>>>,
}

impl RecordingOperator {
    pub(crate) fn confirming(answers: &[Option<bool>]) -> Self {
        Self {
            confirms: Mutex::new(answers.iter().copied().collect()),
            ..Self::default()
        }
    }

    pub(crate) fn answering(answers: &[Option<&str>]) -> Self {
        Self {
            inputs: Mutex::new(answers.iter().map(|a| a.map(str::to_owned)).collect()),
            ..Self::default()
        }
    }

    pub(crate) fn notices(&self) -> Vec<Notice> {
        self.notices.lock().expect("operator lock").clone()
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.notices().into_iter().map(|n| n.to_string()).collect()
    }

    pub(crate) fn questions(&self) -> Vec<String> {
        self.questions.lock().expect("operator lock").clone()
    }
}

impl Operator for RecordingOperator {
    fn notify(&self, notice: &Notice) {
        self.notices
            .lock()
            .expect("operator lock")
            .push(notice.clone());
    }

    fn confirm(&self, prompt: &str) -> Result<bool, CoreError> {
        self.questions
            .lock()
            .expect("operator lock")
            .push(prompt.into());
        match self.confirms.lock().expect("operator lock").pop_front() {
            Some(Some(answer)) => Ok(answer),
            Some(None) => Err(CoreError::Interrupted),
            None => panic!("unexpected confirmation: {prompt}"),
        }
    }

    fn input(&self, prompt: &str) -> Result<Option<String>, CoreError> {
        self.questions
            .lock()
            .expect("operator lock")
            .push(prompt.into());
        match self.inputs.lock().expect("operator lock").pop_front() {
            Some(answer) => Ok(answer),
            None => panic!("unexpected input prompt: {prompt}"),
        }
    }
}

// ── ScriptedReader ───────────────────────────────────────────────

#[derive(Debug, Clone)]
pub(crate) enum Step {
    Line(&'static str),
    Interrupt,
    EndOfInput,
    /// Block until the read is cancelled.
    Block,
}

/// What the reader saw at each read: connectivity at read start, and
/// whether the read ended by cancellation.
#[derive(Debug, Default)]
pub(crate) struct ReadLog {
    pub(crate) started_connected: Vec<bool>,
    pub(crate) cancelled: usize,
}

pub(crate) struct ScriptedReader {
    steps: VecDeque<Step>,
    session: Session,
    pub(crate) log: Arc<Mutex<ReadLog>>,
}

impl ScriptedReader {
    pub(crate) fn new(session: Session, steps: &[Step]) -> Self {
        Self {
            steps: steps.iter().cloned().collect(),
            session,
            log: Arc::default(),
        }
    }
}

#[async_trait]
impl LineReader for ScriptedReader {
    async fn read_line(
        &mut self,
        _prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<ReadOutcome, CoreError> {
        self.log
            .lock()
            .expect("log lock")
            .started_connected
            .push(self.session.is_connected());
        if cancel.is_cancelled() {
            self.log.lock().expect("log lock").cancelled += 1;
            return Ok(ReadOutcome::Cancelled);
        }
        let outcome = match self.steps.pop_front() {
            Some(Step::Line(line)) => ReadOutcome::Line(line.into()),
            Some(Step::Interrupt) => ReadOutcome::Interrupted,
            Some(Step::EndOfInput) | None => ReadOutcome::EndOfInput,
            Some(Step::Block) => {
                cancel.cancelled().await;
                self.log.lock().expect("log lock").cancelled += 1;
                ReadOutcome::Cancelled
            }
        };
        Ok(outcome)
    }
}
