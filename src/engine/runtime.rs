// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::{CommandDefinition, ConfigFile, DefinitionStore, Settings};
use crate::errors::Result;
use crate::exec::temp::allocate_temp_path;
use crate::exec::{ProcessBackend, SpawnRequest};
use crate::fs::{remove_if_exists, FileSystem};
use crate::matcher::{best_match, match_query};
use crate::result::{ActionHost, ResultDispatcher};
use crate::script::{requirements, result_file_path, ScriptBuilder};

use super::core::{CoreCommand, CoreStep, ProcessTable, RunningContext};
use super::{ProcessErrorKind, ProcessHandle, SupervisorEvent, SupervisorOptions};

/// Runs command definitions as child processes and sees each one through to
/// its follow-up action.
///
/// This is the IO shell around [`ProcessTable`]: it reads events from the
/// channel, builds plans, spawns children through a `ProcessBackend`, and
/// executes the commands the table returns (dispatching results, deleting
/// temp files, killing and releasing children). It is the only owner of the
/// table.
pub struct Supervisor<B: ProcessBackend, H: ActionHost> {
    table: ProcessTable,
    store: DefinitionStore,
    settings: Settings,
    builder: ScriptBuilder,
    dispatcher: ResultDispatcher<H>,
    backend: B,
    fs: Arc<dyn FileSystem>,
    event_rx: mpsc::Receiver<SupervisorEvent>,
    options: SupervisorOptions,
}

impl<B: ProcessBackend, H: ActionHost> fmt::Debug for Supervisor<B, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("table", &self.table)
            .field("definitions", &self.store.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<B: ProcessBackend, H: ActionHost> Supervisor<B, H> {
    pub fn new(
        config: ConfigFile,
        builder: ScriptBuilder,
        dispatcher: ResultDispatcher<H>,
        backend: B,
        fs: Arc<dyn FileSystem>,
        event_rx: mpsc::Receiver<SupervisorEvent>,
        options: SupervisorOptions,
    ) -> Self {
        Self {
            table: ProcessTable::new(),
            store: config.store,
            settings: config.settings,
            builder,
            dispatcher,
            backend,
            fs,
            event_rx,
            options,
        }
    }

    /// Number of children currently tracked.
    pub fn running(&self) -> usize {
        self.table.len()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Main event loop.
    ///
    /// - Consumes `SupervisorEvent`s from the channel.
    /// - Execute / Query events build and spawn children.
    /// - Process events go through the table; its commands are executed.
    /// - Stops on `Shutdown`, or once idle when `exit_when_idle` is set.
    pub async fn run(mut self) -> Result<()> {
        info!("supervisor started");

        loop {
            if self.options.exit_when_idle && self.table.is_idle() && self.event_rx.is_empty() {
                info!("no input left and nothing running; exiting");
                break;
            }

            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("supervisor event channel closed; tearing down");
                    self.shutdown();
                    break;
                }
            };

            debug!(?event, "supervisor received event");

            if !self.handle_event(event) {
                info!("shutdown requested; stopping supervisor");
                break;
            }
        }

        info!("supervisor exiting");
        Ok(())
    }

    /// Handle a single event. Returns whether the loop should keep running.
    pub fn handle_event(&mut self, event: SupervisorEvent) -> bool {
        match event {
            SupervisorEvent::Execute {
                definition_id,
                args,
                action_suffix,
            } => {
                match self.store.get(&definition_id) {
                    Some(definition) => {
                        self.execute(definition, &args, action_suffix);
                    }
                    None => warn!(definition = %definition_id, "unknown command definition"),
                }
                true
            }
            SupervisorEvent::Query {
                query,
                action_suffix,
            } => {
                self.execute_query(&query, action_suffix.as_deref());
                true
            }
            other => {
                let step = self.table.step(other);
                let keep_running = step.keep_running;
                self.apply(step);
                keep_running
            }
        }
    }

    /// Run the best match for `query`.
    pub fn execute_query(
        &mut self,
        query: &str,
        action_suffix: Option<&str>,
    ) -> Option<ProcessHandle> {
        let matches = match_query(&self.store, query);
        let Some(chosen) = best_match(&matches, action_suffix) else {
            warn!(%query, action = ?action_suffix, "no command definition matches query");
            return None;
        };
        let definition = self.store.get(&chosen.definition_id)?;
        self.execute(definition, &chosen.args, chosen.action_suffix)
    }

    /// Build a plan for `definition` and spawn it.
    ///
    /// Returns the handle of the new child, or `None` when nothing is
    /// running (build or spawn failure, already logged and cleaned up).
    pub fn execute(
        &mut self,
        definition: Arc<CommandDefinition>,
        args: &str,
        action_suffix: Option<String>,
    ) -> Option<ProcessHandle> {
        let needs = requirements(&definition);
        let temp_path = if needs.temp_path {
            match allocate_temp_path(self.fs.as_ref(), &self.settings.temp_dir, needs.script) {
                Ok(path) => Some(path),
                Err(e) => {
                    error!(definition = %definition.id, error = %e, "cannot prepare temp directory");
                    return None;
                }
            }
        } else {
            None
        };

        let plan = match self.builder.build(&definition, args, temp_path.as_deref()) {
            Ok(plan) => plan,
            Err(e) => {
                error!(definition = %definition.id, error = %e, "failed to build execution plan");
                if let Some(temp) = &temp_path {
                    remove_if_exists(self.fs.as_ref(), temp);
                    remove_if_exists(self.fs.as_ref(), &result_file_path(temp));
                }
                return None;
            }
        };

        let handle = self.table.allocate_handle();
        let request = SpawnRequest::from_plan(&plan, &definition, &self.settings);

        self.table.register(
            handle,
            RunningContext {
                definition: Arc::clone(&definition),
                temp_path,
                result_file: plan.result_file.clone(),
                working_dir: plan.working_dir.clone(),
                action_suffix,
                capture_stdout: request.capture_stdout,
                stdout: Vec::new(),
            },
        );

        if let Err(e) = self.backend.spawn(handle, request) {
            let step = self.table.step(SupervisorEvent::ErrorOccurred {
                handle,
                kind: ProcessErrorKind::FailedToStart,
                message: e.to_string(),
            });
            self.apply(step);
            return None;
        }

        info!(%handle, definition = %definition.id, "command started");
        Some(handle)
    }

    /// Kill and clean up every tracked child.
    pub fn shutdown(&mut self) {
        let mut step = self.table.teardown();
        self.table.flush_disposal(&mut step);
        self.apply(step);
    }

    fn apply(&mut self, step: CoreStep) {
        for command in step.commands {
            match command {
                CoreCommand::Dispatch(outcome) => {
                    self.dispatcher.handle_result(outcome);
                }
                CoreCommand::LogStderr {
                    handle,
                    definition,
                    text,
                } => {
                    warn!(%handle, %definition, "stderr: {}", text);
                }
                CoreCommand::RemoveFiles(files) => {
                    for file in files {
                        remove_if_exists(self.fs.as_ref(), &file);
                    }
                }
                CoreCommand::Kill(handle) => self.backend.kill(handle),
                CoreCommand::Release(handles) => {
                    for handle in handles {
                        self.backend.release(handle);
                    }
                }
            }
        }
    }
}
