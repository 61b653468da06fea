// src/engine/core.rs

//! Pure process-table state machine.
//!
//! [`ProcessTable`] consumes per-process [`SupervisorEvent`]s and produces:
//! - an updated table
//! - a list of [`CoreCommand`]s describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Supervisor`) is responsible for:
//! - reading events from the channel
//! - building plans and spawning children
//! - running the result dispatcher, deleting files, killing children
//!
//! Nothing in here touches Tokio, channels, the filesystem or processes, so
//! the cleanup guarantees can be unit tested directly.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::CommandDefinition;
use crate::engine::{ProcessHandle, ProcessStatus, SupervisorEvent};
use crate::result::ProcessOutcome;
use crate::script::result_file_path;

/// Bookkeeping for one live child.
#[derive(Debug, Clone)]
pub struct RunningContext {
    pub definition: Arc<CommandDefinition>,
    /// Script or temp path to delete at cleanup.
    pub temp_path: Option<PathBuf>,
    /// `<temp>.result`, set only when the definition declares a result file.
    pub result_file: Option<PathBuf>,
    pub working_dir: PathBuf,
    pub action_suffix: Option<String>,
    pub capture_stdout: bool,
    pub stdout: Vec<u8>,
}

impl RunningContext {
    /// Files owned by this context that cleanup must remove.
    fn owned_files(&self) -> Vec<PathBuf> {
        match &self.temp_path {
            Some(temp) => vec![temp.clone(), result_file_path(temp)],
            None => Vec::new(),
        }
    }
}

/// Command produced by the table, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Hand a finished child's outcome to the result dispatcher.
    Dispatch(ProcessOutcome),
    /// Log a chunk of a child's stderr.
    LogStderr {
        handle: ProcessHandle,
        definition: String,
        text: String,
    },
    /// Delete these files if they exist.
    RemoveFiles(Vec<PathBuf>),
    /// Kill a child; it will emit no further events.
    Kill(ProcessHandle),
    /// Dispose of the backend slots of these handles.
    Release(Vec<ProcessHandle>),
}

/// Decision returned after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Table of running contexts keyed by handle.
///
/// Cleanup evicts a context before anything else, so a second cleanup for
/// the same handle finds nothing and does nothing. Disposal of backend slots
/// is deferred: handles are queued and released at the end of the step that
/// cleaned them up.
#[derive(Debug, Default)]
pub struct ProcessTable {
    next_handle: u64,
    contexts: HashMap<ProcessHandle, RunningContext>,
    pending_disposal: Vec<ProcessHandle>,
    input_closed: bool,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a fresh handle. Handles are never reused.
    pub fn allocate_handle(&mut self) -> ProcessHandle {
        self.next_handle += 1;
        ProcessHandle(self.next_handle)
    }

    pub fn register(&mut self, handle: ProcessHandle, context: RunningContext) {
        debug!(%handle, definition = %context.definition.id, "registered running context");
        self.contexts.insert(handle, context);
    }

    pub fn get(&self, handle: ProcessHandle) -> Option<&RunningContext> {
        self.contexts.get(&handle)
    }

    pub fn handles(&self) -> Vec<ProcessHandle> {
        let mut handles: Vec<_> = self.contexts.keys().copied().collect();
        handles.sort();
        handles
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// True once input is closed and no child is left.
    pub fn is_idle(&self) -> bool {
        self.input_closed && self.contexts.is_empty()
    }

    pub fn close_input(&mut self) {
        self.input_closed = true;
    }

    /// Evict `handle` and return the commands that remove its files.
    ///
    /// Returns `None` when the handle was already cleaned up.
    pub fn cleanup(&mut self, handle: ProcessHandle) -> Option<(RunningContext, CoreCommand)> {
        let Some(context) = self.contexts.remove(&handle) else {
            debug!(%handle, "cleanup for unknown handle; already cleaned up");
            return None;
        };
        self.pending_disposal.push(handle);
        let files = CoreCommand::RemoveFiles(context.owned_files());
        Some((context, files))
    }

    /// Handle one per-process or control event.
    ///
    /// `Execute` and `Query` need IO to resolve and are handled by the shell;
    /// passed here they are ignored.
    pub fn step(&mut self, event: SupervisorEvent) -> CoreStep {
        let mut step = match event {
            SupervisorEvent::StdoutReady { handle, bytes } => self.on_stdout(handle, bytes),
            SupervisorEvent::StderrReady { handle, bytes } => self.on_stderr(handle, bytes),
            SupervisorEvent::Finished {
                handle,
                exit_code,
                status,
            } => self.on_finished(handle, exit_code, status),
            SupervisorEvent::ErrorOccurred {
                handle,
                kind,
                message,
            } => {
                match self.get(handle) {
                    Some(ctx) => warn!(
                        %handle,
                        definition = %ctx.definition.id,
                        %kind,
                        %message,
                        "child process error"
                    ),
                    None => warn!(%handle, %kind, %message, "error event for unknown handle"),
                }
                CoreStep::running(self.cleanup(handle).map(|(_, c)| c).into_iter().collect())
            }
            SupervisorEvent::InputClosed => {
                self.close_input();
                CoreStep::running(Vec::new())
            }
            SupervisorEvent::Shutdown => self.teardown(),
            SupervisorEvent::Execute { .. } | SupervisorEvent::Query { .. } => {
                CoreStep::running(Vec::new())
            }
        };

        self.flush_disposal(&mut step);
        step
    }

    /// Kill and clean up every tracked child.
    pub fn teardown(&mut self) -> CoreStep {
        let mut commands = Vec::new();
        for handle in self.handles() {
            commands.push(CoreCommand::Kill(handle));
            if let Some((_, remove)) = self.cleanup(handle) {
                commands.push(remove);
            }
        }
        CoreStep {
            commands,
            keep_running: false,
        }
    }

    /// Append queued disposals to `step` as one `Release` command.
    pub fn flush_disposal(&mut self, step: &mut CoreStep) {
        if !self.pending_disposal.is_empty() {
            let handles = std::mem::take(&mut self.pending_disposal);
            step.commands.push(CoreCommand::Release(handles));
        }
    }

    fn on_stdout(&mut self, handle: ProcessHandle, bytes: Vec<u8>) -> CoreStep {
        match self.contexts.get_mut(&handle) {
            Some(ctx) if ctx.capture_stdout => ctx.stdout.extend_from_slice(&bytes),
            Some(_) => {}
            None => warn!(%handle, "stdout for unknown handle ignored"),
        }
        CoreStep::running(Vec::new())
    }

    fn on_stderr(&mut self, handle: ProcessHandle, bytes: Vec<u8>) -> CoreStep {
        let Some(ctx) = self.contexts.get(&handle) else {
            warn!(%handle, "stderr for unknown handle ignored");
            return CoreStep::running(Vec::new());
        };

        let text = String::from_utf8_lossy(&bytes).trim_end().to_string();
        if text.is_empty() {
            return CoreStep::running(Vec::new());
        }
        CoreStep::running(vec![CoreCommand::LogStderr {
            handle,
            definition: ctx.definition.id.clone(),
            text,
        }])
    }

    fn on_finished(
        &mut self,
        handle: ProcessHandle,
        exit_code: i32,
        status: ProcessStatus,
    ) -> CoreStep {
        let Some((context, remove)) = self.cleanup(handle) else {
            warn!(%handle, "finish for unknown handle ignored");
            return CoreStep::running(Vec::new());
        };

        let outcome = ProcessOutcome {
            exit_code,
            status,
            definition: context.definition,
            stdout: context.stdout,
            result_file: context.result_file,
            working_dir: context.working_dir,
            action_suffix: context.action_suffix,
        };

        CoreStep::running(vec![CoreCommand::Dispatch(outcome), remove])
    }
}
