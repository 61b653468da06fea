use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use cmdrunner::engine::SupervisorEvent;
use cmdrunner::result::ActionHost;
use tokio::sync::mpsc;

/// One call made to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    OpenPath(PathBuf),
    CopyText(String),
    Requery(String),
    OpenWith { app: String, path: PathBuf },
    Launch { program: String, args: Vec<String> },
}

/// An `ActionHost` that records calls instead of touching the desktop.
///
/// With a requery channel attached, `requery` also feeds a `Query` event
/// back, like the desktop host does.
#[derive(Debug, Default, Clone)]
pub struct RecordingHost {
    calls: Arc<Mutex<Vec<HostCall>>>,
    requery_tx: Option<mpsc::Sender<SupervisorEvent>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_requery(mut self, tx: mpsc::Sender<SupervisorEvent>) -> Self {
        self.requery_tx = Some(tx);
        self
    }

    /// Shared view of the recorded calls.
    pub fn calls(&self) -> Arc<Mutex<Vec<HostCall>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ActionHost for RecordingHost {
    fn open_path(&mut self, path: &Path) -> Result<()> {
        self.record(HostCall::OpenPath(path.to_path_buf()));
        Ok(())
    }

    fn copy_text(&mut self, text: &str) -> Result<()> {
        self.record(HostCall::CopyText(text.to_string()));
        Ok(())
    }

    fn requery(&mut self, query: &str) -> Result<()> {
        self.record(HostCall::Requery(query.to_string()));
        if let Some(tx) = &self.requery_tx {
            tx.try_send(SupervisorEvent::Query {
                query: query.to_string(),
                action_suffix: None,
            })?;
        }
        Ok(())
    }

    fn open_with(&mut self, app: &str, path: &Path) -> Result<()> {
        self.record(HostCall::OpenWith {
            app: app.to_string(),
            path: path.to_path_buf(),
        });
        Ok(())
    }

    fn launch_detached(&mut self, program: &str, args: &[String], _working_dir: &Path) -> Result<()> {
        self.record(HostCall::Launch {
            program: program.to_string(),
            args: args.to_vec(),
        });
        Ok(())
    }
}
