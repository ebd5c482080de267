//! Process runner: owns one compiler child process and streams its output.
//!
//! [`run`] returns a channel that yields every stdout and stderr line in
//! delivery order, a [`ProcessEvent::StdoutClosed`] marker once stdout hits
//! EOF, and exactly one terminal [`ProcessEvent::Finished`].

use std::io;
use std::process::Stdio;

use tokio::io::AsyncRead;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::codec::LineReader;
use crate::error::RunError;
use crate::types::{RunOutcome, RunRequest};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Exit code reported when the process ended without one (e.g. by signal).
const UNKNOWN_EXIT_CODE: i32 = -1;

#[derive(Debug)]
pub enum ProcessEvent {
    Stdout(String),
    Stderr(String),
    /// Stdout reached EOF. Sent at most once, before `Finished`.
    StdoutClosed,
    /// Terminal event. Always the last event of a run.
    Finished(RunOutcome),
}

/// Spawn the compiler described by `request` on the current runtime.
///
/// The child is killed if the runner task is dropped before it exits.
pub fn run(request: RunRequest) -> mpsc::Receiver<ProcessEvent> {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    tokio::spawn(async move {
        let outcome = drive(&request, &tx).await;
        let _ = tx.send(ProcessEvent::Finished(outcome)).await;
    });
    rx
}

fn spawn(request: &RunRequest) -> Result<Child, RunError> {
    let not_found = || RunError::ExecutableNotFound {
        program: request.executable.clone(),
    };
    let resolved = which::which(&request.executable).map_err(|_| not_found())?;

    let mut cmd = Command::new(&resolved);
    cmd.args(&request.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    cmd.spawn().map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            not_found()
        } else {
            RunError::Spawn {
                program: request.executable.clone(),
                source,
            }
        }
    })
}

async fn drive(request: &RunRequest, tx: &mpsc::Sender<ProcessEvent>) -> RunOutcome {
    let mut child = match spawn(request) {
        Ok(child) => child,
        Err(e) => {
            tracing::debug!(error = %e, "Compiler did not start");
            return RunOutcome::Failed(e);
        }
    };
    tracing::debug!(
        executable = %request.executable.display(),
        pid = child.id(),
        "Compiler started"
    );

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_pump = async {
        if let Some(stdout) = stdout {
            pump(stdout, tx, ProcessEvent::Stdout).await;
        }
        let _ = tx.send(ProcessEvent::StdoutClosed).await;
    };
    let stderr_pump = async {
        if let Some(stderr) = stderr {
            pump(stderr, tx, ProcessEvent::Stderr).await;
        }
    };
    tokio::join!(stdout_pump, stderr_pump);

    match child.wait().await {
        Ok(status) => RunOutcome::Exited(status.code().unwrap_or(UNKNOWN_EXIT_CODE)),
        Err(e) => RunOutcome::Failed(RunError::Wait(e)),
    }
}

/// Forward lines until EOF. Keeps draining after the receiver is gone so the
/// child never blocks on a full pipe.
async fn pump<R>(reader: R, tx: &mpsc::Sender<ProcessEvent>, wrap: fn(String) -> ProcessEvent)
where
    R: AsyncRead + Unpin,
{
    let mut lines = LineReader::new(reader);
    let mut forwarding = true;
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if forwarding && tx.send(wrap(line)).await.is_err() {
                    forwarding = false;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Compiler output read error: {e}");
                break;
            }
        }
    }
}
