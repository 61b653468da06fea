// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] provides the `ProcessBackend` trait and the production
//!   `TokioProcessBackend`; tests replace it with a fake.
//! - [`runner`] owns one child process, forwards its output and reports how
//!   it ended as `SupervisorEvent`s.
//! - [`terminal`] knows how to hand a script to a terminal emulator.
//! - [`temp`] allocates unique temporary paths.

use std::path::PathBuf;

use crate::config::{CommandDefinition, Settings};
use crate::script::{quote_for_shell, ExecutionPlan, ExecutionStrategy};
use crate::types::ExecutionMode;

pub mod backend;
pub mod runner;
pub mod temp;
pub mod terminal;

pub use backend::{ProcessBackend, SpawnError, TokioProcessBackend};

/// Everything a backend needs to start one child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Forward stdout as `StdoutReady` events; otherwise it is discarded.
    pub capture_stdout: bool,
}

impl SpawnRequest {
    /// Turn a plan into a concrete program and argument vector.
    pub fn from_plan(
        plan: &ExecutionPlan,
        definition: &CommandDefinition,
        settings: &Settings,
    ) -> Self {
        let (program, args) = match (&plan.strategy, definition.execution_mode) {
            (ExecutionStrategy::Script { path }, ExecutionMode::Terminal) => {
                terminal::terminal_command(settings, path)
            }
            (ExecutionStrategy::Script { path }, ExecutionMode::Background) => (
                "sh".to_string(),
                vec![
                    "-c".to_string(),
                    quote_for_shell(&path.to_string_lossy()),
                ],
            ),
            (ExecutionStrategy::Shell { command }, _) => {
                ("sh".to_string(), vec!["-c".to_string(), command.clone()])
            }
            (ExecutionStrategy::Direct { program, args }, _) => (program.clone(), args.clone()),
        };

        Self {
            program,
            args,
            working_dir: plan.working_dir.clone(),
            capture_stdout: definition.captures_stdout(),
        }
    }
}
