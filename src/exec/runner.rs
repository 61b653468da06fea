// src/exec/runner.rs

//! Individual child process runner.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout_at, Duration, Instant};
use tracing::{debug, info, warn};

use crate::engine::{ProcessErrorKind, ProcessHandle, ProcessStatus, SupervisorEvent};

const READ_CHUNK: usize = 8192;

/// How long output may keep flowing once the child has exited.
const OUTPUT_DRAIN: Duration = Duration::from_millis(250);

/// Own `child` until it ends, forwarding its output and reporting the end.
///
/// - stdout is forwarded as `StdoutReady` when `capture_stdout` is set and
///   drained otherwise; every chunk read before `Finished` is sent first.
/// - `Finished` follows the child's own exit. Readers still open after a
///   short drain window (a backgrounded grandchild holding the pipes) are
///   aborted.
/// - stderr is forwarded line by line as `StderrReady`.
/// - If the cancel channel fires, the child is killed and **no** further
///   event is sent for it.
pub async fn run_child(
    handle: ProcessHandle,
    mut child: Child,
    capture_stdout: bool,
    events_tx: mpsc::Sender<SupervisorEvent>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let stdout_task = child.stdout.take().map(|stdout| {
        tokio::spawn(forward_stdout(handle, stdout, capture_stdout, events_tx.clone()))
    });
    let stderr_task = child
        .stderr
        .take()
        .map(|stderr| tokio::spawn(forward_stderr(handle, stderr, events_tx.clone())));

    let aborts: Vec<_> = stdout_task
        .iter()
        .chain(stderr_task.iter())
        .map(|t| t.abort_handle())
        .collect();

    let completion = async {
        let status = child.wait().await;
        // A backgrounded grandchild can hold the pipes open long after the
        // child itself has gone.
        let deadline = Instant::now() + OUTPUT_DRAIN;
        let mut read_failed = false;
        for mut task in [stdout_task, stderr_task].into_iter().flatten() {
            match timeout_at(deadline, &mut task).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => {
                    warn!(%handle, error = %e, "failed reading child output");
                    read_failed = true;
                }
                Ok(Err(e)) => debug!(%handle, error = %e, "output reader task did not complete"),
                Err(_) => {
                    debug!(%handle, "output still open after child exited; detaching readers");
                    task.abort();
                }
            }
        }
        (status, read_failed)
    };

    tokio::select! {
        (status, read_failed) = completion => {
            let event = match status {
                Ok(_) if read_failed => SupervisorEvent::ErrorOccurred {
                    handle,
                    kind: ProcessErrorKind::ReadError,
                    message: "failed reading child output".to_string(),
                },
                Ok(status) => {
                    let (exit_code, status_kind) = match status.code() {
                        Some(code) => (code, ProcessStatus::Normal),
                        None => (-1, ProcessStatus::Crashed),
                    };
                    info!(%handle, exit_code, ?status_kind, "child process exited");
                    SupervisorEvent::Finished {
                        handle,
                        exit_code,
                        status: status_kind,
                    }
                }
                Err(e) => SupervisorEvent::ErrorOccurred {
                    handle,
                    kind: ProcessErrorKind::Unknown,
                    message: format!("waiting for child failed: {e}"),
                },
            };

            if events_tx.send(event).await.is_err() {
                debug!(%handle, "supervisor gone; dropping process end event");
            }
        }

        cancel = &mut cancel_rx => {
            for abort in &aborts {
                abort.abort();
            }
            match cancel {
                Ok(()) => {
                    info!(%handle, "kill requested; stopping child process");
                    if let Err(e) = child.kill().await {
                        warn!(%handle, error = %e, "failed to kill child process");
                    }
                }
                Err(_) => {
                    // Backend dropped; kill_on_drop takes the child down.
                    debug!(%handle, "cancel channel closed without explicit kill");
                }
            }
        }
    }
}

async fn forward_stdout<R>(
    handle: ProcessHandle,
    mut stdout: R,
    capture: bool,
    events_tx: mpsc::Sender<SupervisorEvent>,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = stdout.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        if capture {
            let event = SupervisorEvent::StdoutReady {
                handle,
                bytes: buf[..n].to_vec(),
            };
            if events_tx.send(event).await.is_err() {
                return Ok(());
            }
        }
    }
}

async fn forward_stderr<R>(
    handle: ProcessHandle,
    stderr: R,
    events_tx: mpsc::Sender<SupervisorEvent>,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stderr);
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(());
        }
        let event = SupervisorEvent::StderrReady {
            handle,
            bytes: line.clone(),
        };
        if events_tx.send(event).await.is_err() {
            return Ok(());
        }
    }
}
