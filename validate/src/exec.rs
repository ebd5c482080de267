//! Drives one run: consumes runner events, classifies lines, notifies
//! observers and produces the final report.

use std::io;
use std::sync::Arc;

use ksp_types::{Diagnostic, DocumentKey};
use tokio::sync::mpsc;

use crate::classify::{StderrClassifier, StderrItem, StdoutLine, classify_stdout};
use crate::error::RunError;
use crate::observer::RunObserver;
use crate::runner::ProcessEvent;
use crate::types::{Notice, NoticeKind, RunOutcome};

/// Everything a finished run produced. Diagnostics are in output order.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub diagnostics: Vec<Diagnostic>,
    pub notices: Vec<Notice>,
}

impl RunReport {
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.outcome.exit_code()
    }
}

/// Consume `events` to the terminal event.
///
/// Nothing is published before the stream ends; the caller receives the
/// complete diagnostic set at once.
pub async fn collect(
    document: &DocumentKey,
    mut events: mpsc::Receiver<ProcessEvent>,
    observers: &[Arc<dyn RunObserver>],
) -> RunReport {
    let mut diagnostics = Vec::new();
    let mut notices = Vec::new();
    let mut stderr = StderrClassifier::new();

    let outcome = loop {
        let Some(event) = events.recv().await else {
            // The runner task went away without reporting; still end the run.
            break RunOutcome::Failed(RunError::Wait(io::Error::other(
                "compiler runner stopped unexpectedly",
            )));
        };
        match event {
            ProcessEvent::Stdout(line) => {
                for observer in observers {
                    observer.on_stdout_line(document, &line);
                }
                match classify_stdout(&line) {
                    StdoutLine::Diagnostic(diag) => diagnostics.push(diag),
                    StdoutLine::Unmatched => {}
                }
            }
            ProcessEvent::Stderr(line) => {
                for observer in observers {
                    observer.on_stderr_line(document, &line);
                }
                match stderr.feed(&line) {
                    Some(StderrItem::Diagnostic(diag)) => diagnostics.push(diag),
                    Some(StderrItem::Notice { kind, message }) => {
                        notices.push(Notice::new(kind, Some(document.clone()), message));
                    }
                    None => {}
                }
            }
            ProcessEvent::StdoutClosed => {
                for observer in observers {
                    observer.on_run_end(document);
                }
            }
            ProcessEvent::Finished(outcome) => break outcome,
        }
    };
    stderr.finish();

    match &outcome {
        RunOutcome::Exited(code) => {
            for observer in observers {
                observer.on_exit(document, *code);
            }
            if *code != 0 {
                notices.push(Notice::new(
                    NoticeKind::CompileFailed { code: *code },
                    Some(document.clone()),
                    format!("Compile failed with exit code {code}"),
                ));
            }
        }
        RunOutcome::Failed(err @ RunError::ExecutableNotFound { .. }) => {
            let text = format!("{err}. Check the compiler executable setting.");
            for observer in observers {
                observer.on_error(document, &text);
            }
            notices.push(Notice::new(
                NoticeKind::ExecutableNotFound,
                Some(document.clone()),
                text,
            ));
        }
        RunOutcome::Failed(err) => {
            let text = err.to_string();
            if matches!(err, RunError::Wait(_)) {
                // The process started, so it still owes an exit.
                for observer in observers {
                    observer.on_exit(document, -1);
                }
            }
            for observer in observers {
                observer.on_exception(document, &text);
            }
            notices.push(Notice::new(
                NoticeKind::ExecutionError,
                Some(document.clone()),
                text,
            ));
        }
    }

    tracing::debug!(
        document = %document,
        exit_code = ?outcome.exit_code(),
        diagnostics = diagnostics.len(),
        notices = notices.len(),
        "Compiler run finished"
    );

    RunReport {
        outcome,
        diagnostics,
        notices,
    }
}
