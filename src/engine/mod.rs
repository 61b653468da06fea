// src/engine/mod.rs

//! Process supervisor for cmdrunner.
//!
//! The supervisor reacts to:
//! - execute / query requests (CLI, stdin, requery hand-off)
//! - per-process events from runner tasks (stdout, stderr, finish, error)
//! - shutdown signals
//!
//! The pure process table lives in [`core`]; the async/IO shell that builds
//! plans, spawns children and runs the dispatcher is in [`runtime`].

use std::fmt;

/// Opaque, monotonically allocated identifier of one supervised child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessHandle(pub u64);

impl fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Exited on its own with an exit code.
    Normal,
    /// Terminated by a signal or otherwise without an exit code.
    Crashed,
}

/// Why a child could not be run to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessErrorKind {
    FailedToStart,
    ReadError,
    Unknown,
}

impl fmt::Display for ProcessErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessErrorKind::FailedToStart => f.write_str("failed to start"),
            ProcessErrorKind::ReadError => f.write_str("read error"),
            ProcessErrorKind::Unknown => f.write_str("unknown error"),
        }
    }
}

/// Options for the supervisor loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupervisorOptions {
    /// Leave the loop once input is closed and no child is running.
    pub exit_when_idle: bool,
}

/// Events flowing into the supervisor.
#[derive(Debug, Clone)]
pub enum SupervisorEvent {
    /// Run the definition with `id` and the given argument string.
    Execute {
        definition_id: String,
        args: String,
        action_suffix: Option<String>,
    },
    /// Match free text against the definitions and run the best match.
    Query {
        query: String,
        action_suffix: Option<String>,
    },
    StdoutReady {
        handle: ProcessHandle,
        bytes: Vec<u8>,
    },
    StderrReady {
        handle: ProcessHandle,
        bytes: Vec<u8>,
    },
    Finished {
        handle: ProcessHandle,
        exit_code: i32,
        status: ProcessStatus,
    },
    ErrorOccurred {
        handle: ProcessHandle,
        kind: ProcessErrorKind,
        message: String,
    },
    /// No further execute/query requests will arrive.
    InputClosed,
    /// Tear down every running child and stop (e.g. Ctrl-C).
    Shutdown,
}

pub mod core;
pub mod runtime;

pub use self::core::{CoreCommand, CoreStep, ProcessTable, RunningContext};
pub use runtime::Supervisor;
