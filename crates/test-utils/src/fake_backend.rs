use std::io;
use std::sync::{Arc, Mutex};

use cmdrunner::engine::{ProcessHandle, ProcessStatus, SupervisorEvent};
use cmdrunner::exec::{ProcessBackend, SpawnError, SpawnRequest};
use tokio::sync::mpsc;

/// What the fake does when asked to spawn.
#[derive(Debug, Clone)]
pub enum FakeBehaviour {
    /// Emit the stdout chunks, then `Finished` with `exit_code`.
    Exit { stdout: Vec<Vec<u8>>, exit_code: i32 },
    /// Emit `Finished` with `ProcessStatus::Crashed`.
    Crash,
    /// Refuse to start.
    FailToStart,
    /// Start and never report anything (until killed).
    Hang,
}

impl FakeBehaviour {
    pub fn stdout(text: &str) -> Self {
        FakeBehaviour::Exit {
            stdout: vec![text.as_bytes().to_vec()],
            exit_code: 0,
        }
    }
}

/// Everything the fake was asked to do.
#[derive(Debug, Default, Clone)]
pub struct FakeLog {
    pub spawned: Vec<(ProcessHandle, SpawnRequest)>,
    pub killed: Vec<ProcessHandle>,
    pub released: Vec<ProcessHandle>,
}

/// A fake backend that:
/// - records spawn / kill / release calls
/// - immediately queues the events its behaviour describes.
pub struct FakeBackend {
    events_tx: mpsc::Sender<SupervisorEvent>,
    behaviour: FakeBehaviour,
    log: Arc<Mutex<FakeLog>>,
}

impl FakeBackend {
    pub fn new(events_tx: mpsc::Sender<SupervisorEvent>, behaviour: FakeBehaviour) -> Self {
        Self {
            events_tx,
            behaviour,
            log: Arc::new(Mutex::new(FakeLog::default())),
        }
    }

    /// Shared view of the call log, usable after the backend has moved into
    /// a supervisor.
    pub fn log(&self) -> Arc<Mutex<FakeLog>> {
        Arc::clone(&self.log)
    }

    fn emit(&self, event: SupervisorEvent) {
        self.events_tx
            .try_send(event)
            .expect("fake backend event channel full or closed");
    }
}

impl ProcessBackend for FakeBackend {
    fn spawn(&mut self, handle: ProcessHandle, request: SpawnRequest) -> Result<(), SpawnError> {
        self.log
            .lock()
            .unwrap()
            .spawned
            .push((handle, request.clone()));

        match self.behaviour.clone() {
            FakeBehaviour::Exit { stdout, exit_code } => {
                for bytes in stdout {
                    self.emit(SupervisorEvent::StdoutReady { handle, bytes });
                }
                self.emit(SupervisorEvent::Finished {
                    handle,
                    exit_code,
                    status: ProcessStatus::Normal,
                });
            }
            FakeBehaviour::Crash => self.emit(SupervisorEvent::Finished {
                handle,
                exit_code: -1,
                status: ProcessStatus::Crashed,
            }),
            FakeBehaviour::FailToStart => {
                return Err(SpawnError {
                    program: request.program,
                    source: io::Error::new(io::ErrorKind::NotFound, "no such program"),
                });
            }
            FakeBehaviour::Hang => {}
        }
        Ok(())
    }

    fn kill(&mut self, handle: ProcessHandle) {
        self.log.lock().unwrap().killed.push(handle);
    }

    fn release(&mut self, handle: ProcessHandle) {
        self.log.lock().unwrap().released.push(handle);
    }
}
