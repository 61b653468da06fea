// src/result/host.rs

//! Seam between the dispatcher and the desktop.
//!
//! Production code uses [`DesktopHost`]; tests provide a recording
//! implementation so that no programs are launched.

use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, Context, Result};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::engine::SupervisorEvent;

/// Side effects available to follow-up actions.
pub trait ActionHost {
    /// Open a file or directory with the desktop's default handler.
    fn open_path(&mut self, path: &Path) -> Result<()>;
    fn copy_text(&mut self, text: &str) -> Result<()>;
    /// Feed `query` back in as a new query.
    fn requery(&mut self, query: &str) -> Result<()>;
    /// Open `path` with a specific application.
    fn open_with(&mut self, app: &str, path: &Path) -> Result<()>;
    /// Start a program and forget about it.
    fn launch_detached(&mut self, program: &str, args: &[String], working_dir: &Path)
        -> Result<()>;
}

/// Clipboard contents this process still owns.
///
/// On X11 and Wayland a copy lives in the copying process until another
/// client takes the selection, so a one-shot run has to stay alive until
/// [`ClipboardOwners::released`] resolves.
#[derive(Debug, Clone, Default)]
pub struct ClipboardOwners {
    pending: Arc<Mutex<Vec<oneshot::Receiver<()>>>>,
}

impl ClipboardOwners {
    fn track(&self, released: oneshot::Receiver<()>) {
        self.lock().push(released);
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Wait until every copied text has been handed over or dropped.
    pub async fn released(&self) {
        loop {
            let next = self.lock().pop();
            let Some(next) = next else {
                return;
            };
            // A dropped sender means the owner thread is gone too.
            let _ = next.await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<oneshot::Receiver<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Host backed by the real desktop: `xdg-open` (or `open` on macOS), the
/// system clipboard via `arboard`, and a channel back into the supervisor
/// for requery.
pub struct DesktopHost {
    requery_tx: Option<mpsc::Sender<SupervisorEvent>>,
    clipboard: ClipboardOwners,
}

impl fmt::Debug for DesktopHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesktopHost")
            .field("requery", &self.requery_tx.is_some())
            .field("clipboard_owned", &!self.clipboard.is_empty())
            .finish()
    }
}

impl DesktopHost {
    /// `requery_tx` receives a `Query` event per requery; without it,
    /// requery is logged and dropped.
    pub fn new(requery_tx: Option<mpsc::Sender<SupervisorEvent>>) -> Self {
        Self {
            requery_tx,
            clipboard: ClipboardOwners::default(),
        }
    }

    /// Shared view of the clipboard texts this host still owns.
    pub fn clipboard_owners(&self) -> ClipboardOwners {
        self.clipboard.clone()
    }

    fn opener() -> &'static str {
        if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        }
    }
}

/// Set the clipboard and block until another client takes it over.
#[cfg(all(
    unix,
    not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))
))]
fn hold_clipboard(text: String) -> Result<(), arboard::Error> {
    use arboard::SetExtLinux;

    arboard::Clipboard::new()?.set().wait().text(text)
}

/// Set the clipboard; the system keeps the text after we exit.
#[cfg(not(all(
    unix,
    not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))
)))]
fn hold_clipboard(text: String) -> Result<(), arboard::Error> {
    arboard::Clipboard::new()?.set_text(text)
}

impl ActionHost for DesktopHost {
    fn open_path(&mut self, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or(path);
        self.launch_detached(Self::opener(), &[path.to_string_lossy().into_owned()], dir)
    }

    fn copy_text(&mut self, text: &str) -> Result<()> {
        let text = text.to_string();
        let chars = text.chars().count();
        let (released_tx, released_rx) = oneshot::channel();

        std::thread::Builder::new()
            .name("clipboard-owner".into())
            .spawn(move || {
                match hold_clipboard(text) {
                    Ok(()) => debug!("clipboard text handed over"),
                    Err(e) => warn!(error = %e, "setting clipboard text failed"),
                }
                let _ = released_tx.send(());
            })
            .context("starting clipboard thread")?;

        self.clipboard.track(released_rx);
        info!(chars, "copied result to clipboard");
        Ok(())
    }

    fn requery(&mut self, query: &str) -> Result<()> {
        let Some(tx) = &self.requery_tx else {
            info!(%query, "requery requested but no query channel is attached");
            return Ok(());
        };
        tx.try_send(SupervisorEvent::Query {
            query: query.to_string(),
            action_suffix: None,
        })
        .map_err(|e| anyhow!("sending requery: {e}"))
    }

    fn open_with(&mut self, app: &str, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or(path);
        self.launch_detached(app, &[path.to_string_lossy().into_owned()], dir)
    }

    fn launch_detached(
        &mut self,
        program: &str,
        args: &[String],
        working_dir: &Path,
    ) -> Result<()> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if working_dir.is_dir() {
            cmd.current_dir(working_dir);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("launching '{program}'"))?;
        debug!(%program, ?args, "launched detached process");

        // Reap the child so it does not linger as a zombie.
        tokio::spawn(async move {
            let _ = child.wait().await;
        });
        Ok(())
    }
}
