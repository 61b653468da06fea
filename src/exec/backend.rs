// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The supervisor talks to a `ProcessBackend` instead of spawning processes
//! itself. This makes it easy to swap in a fake backend in tests while
//! keeping the production implementation on `tokio::process`.
//!
//! - `TokioProcessBackend` starts a real child per request and hands it to a
//!   runner task that reports back over the supervisor's event channel.
//! - Tests can provide their own `ProcessBackend` that records requests and
//!   emits scripted events.

use std::collections::HashMap;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::engine::{ProcessHandle, SupervisorEvent};

use super::runner::run_child;
use super::SpawnRequest;

#[derive(Error, Debug)]
#[error("failed to start '{program}': {source}")]
pub struct SpawnError {
    pub program: String,
    #[source]
    pub source: std::io::Error,
}

/// Trait abstracting how children are started and stopped.
///
/// Every event for a spawned child must carry the `handle` it was spawned
/// with, and all `StdoutReady` events must precede its `Finished` event.
pub trait ProcessBackend: Send {
    /// Start a child for `handle`. Failing to start is reported here, not as
    /// an event.
    fn spawn(&mut self, handle: ProcessHandle, request: SpawnRequest) -> Result<(), SpawnError>;

    /// Ask the child to stop. A killed child emits no further events.
    fn kill(&mut self, handle: ProcessHandle);

    /// Drop any bookkeeping for `handle`. Called once the supervisor has
    /// finished with the child.
    fn release(&mut self, handle: ProcessHandle);
}

/// Internal handle for a running child.
///
/// - `cancel` asks the runner to kill the child.
/// - `task` is the Tokio task that owns the child.
struct ActiveProcess {
    cancel: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<()>,
}

/// Production backend on `tokio::process`.
pub struct TokioProcessBackend {
    events_tx: mpsc::Sender<SupervisorEvent>,
    active: HashMap<ProcessHandle, ActiveProcess>,
}

impl TokioProcessBackend {
    pub fn new(events_tx: mpsc::Sender<SupervisorEvent>) -> Self {
        Self {
            events_tx,
            active: HashMap::new(),
        }
    }

    /// Number of children whose bookkeeping has not been released yet.
    pub fn tracked(&self) -> usize {
        self.active.len()
    }
}

impl ProcessBackend for TokioProcessBackend {
    fn spawn(&mut self, handle: ProcessHandle, request: SpawnRequest) -> Result<(), SpawnError> {
        info!(
            %handle,
            program = %request.program,
            args = ?request.args,
            working_dir = %request.working_dir.display(),
            "starting child process"
        );

        let mut cmd = Command::new(&request.program);
        cmd.args(&request.args)
            .current_dir(&request.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| SpawnError {
            program: request.program.clone(),
            source,
        })?;

        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let events_tx = self.events_tx.clone();
        let capture = request.capture_stdout;

        let task = tokio::spawn(async move {
            run_child(handle, child, capture, events_tx, cancel_rx).await;
            debug!(%handle, "runner task finished");
        });

        self.active.insert(
            handle,
            ActiveProcess {
                cancel: Some(cancel_tx),
                task,
            },
        );
        Ok(())
    }

    fn kill(&mut self, handle: ProcessHandle) {
        let Some(active) = self.active.get_mut(&handle) else {
            debug!(%handle, "kill requested for unknown handle");
            return;
        };

        match active.cancel.take() {
            Some(cancel) => {
                if cancel.send(()).is_err() {
                    debug!(%handle, "child already finished while killing");
                }
            }
            None => debug!(%handle, "kill already requested"),
        }
    }

    fn release(&mut self, handle: ProcessHandle) {
        if let Some(active) = self.active.remove(&handle) {
            if !active.task.is_finished() {
                debug!(%handle, "released runner is still winding down");
            }
        }
    }
}
