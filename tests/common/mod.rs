#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use cmdrunner::config::ConfigFile;
use cmdrunner::engine::{Supervisor, SupervisorEvent, SupervisorOptions};
use cmdrunner::fs::mock::MockFileSystem;
use cmdrunner::fs::FileSystem;
use cmdrunner::result::ResultDispatcher;
use cmdrunner::script::ScriptBuilder;
use cmdrunner_test_utils::fake_backend::{FakeBackend, FakeBehaviour, FakeLog};
use cmdrunner_test_utils::recording_host::{HostCall, RecordingHost};

pub const HOME: &str = "/home/me";
pub const TEMP_DIR: &str = "/tmp/cmdrunner-test";
pub const INSTALL_DIR: &str = "/opt/cmdrunner";

/// A supervisor wired to a fake backend, a mock filesystem and a recording
/// host, plus shared views onto all three.
pub struct Harness {
    pub tx: mpsc::Sender<SupervisorEvent>,
    pub supervisor: Supervisor<FakeBackend, RecordingHost>,
    pub fs: MockFileSystem,
    pub backend_log: Arc<Mutex<FakeLog>>,
    pub calls: Arc<Mutex<Vec<HostCall>>>,
}

impl Harness {
    pub fn new(cfg: ConfigFile, behaviour: FakeBehaviour) -> Self {
        let (tx, rx) = mpsc::channel::<SupervisorEvent>(32);
        let fs = MockFileSystem::new();
        let shared_fs: Arc<dyn FileSystem> = Arc::new(fs.clone());

        let backend = FakeBackend::new(tx.clone(), behaviour);
        let backend_log = backend.log();

        let host = RecordingHost::new().with_requery(tx.clone());
        let calls = host.calls();

        let builder = ScriptBuilder::new(
            Arc::clone(&shared_fs),
            PathBuf::from(HOME),
            PathBuf::from(INSTALL_DIR),
        );
        let dispatcher =
            ResultDispatcher::new(Arc::clone(&shared_fs), host, PathBuf::from(INSTALL_DIR));

        let options = SupervisorOptions {
            exit_when_idle: true,
        };
        let supervisor = Supervisor::new(cfg, builder, dispatcher, backend, shared_fs, rx, options);

        Self {
            tx,
            supervisor,
            fs,
            backend_log,
            calls,
        }
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn log(&self) -> FakeLog {
        self.backend_log.lock().unwrap().clone()
    }

    /// Run the supervisor loop to completion (bounded by a timeout) and
    /// report what happened.
    pub async fn run_to_end(self) -> RunReport {
        let Harness {
            tx: _tx,
            supervisor,
            fs,
            backend_log,
            calls,
        } = self;

        cmdrunner_test_utils::with_timeout(supervisor.run())
            .await
            .expect("supervisor returned an error");

        let log = backend_log.lock().unwrap().clone();
        let calls = calls.lock().unwrap().clone();
        RunReport { fs, log, calls }
    }
}

/// What a finished supervisor run left behind.
pub struct RunReport {
    pub fs: MockFileSystem,
    pub log: FakeLog,
    pub calls: Vec<HostCall>,
}

/// Send each query followed by `InputClosed`.
pub async fn feed(tx: &mpsc::Sender<SupervisorEvent>, queries: &[&str]) {
    for query in queries {
        tx.send(SupervisorEvent::Query {
            query: query.to_string(),
            action_suffix: None,
        })
        .await
        .unwrap();
    }
    tx.send(SupervisorEvent::InputClosed).await.unwrap();
}
