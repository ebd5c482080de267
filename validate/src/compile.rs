//! One-shot compilation of a script.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ksp_types::{Diagnostic, DocumentKey};

use crate::error::CompileError;
use crate::exec;
use crate::observer::{OutputEcho, RunObserver};
use crate::runner;
use crate::types::{CompilerOptions, Notice, NoticeKind, RunOutcome, RunRequest};

#[derive(Debug)]
pub struct CompileReport {
    pub document: DocumentKey,
    pub exit_code: i32,
    pub diagnostics: Vec<Diagnostic>,
    pub notices: Vec<Notice>,
    /// Compiled source when no output path was given.
    pub text: Option<String>,
    /// Output file written by the compiler, if one was requested.
    pub output: Option<PathBuf>,
}

impl CompileReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// `Err(CompileError::Failed)` for a nonzero exit.
    pub fn check(&self) -> Result<(), CompileError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(CompileError::Failed {
                code: self.exit_code,
            })
        }
    }
}

/// Compile `input` into `output`, or into a temporary file whose contents
/// are returned in [`CompileReport::text`].
///
/// A nonzero exit is a report, not an error; errors are reserved for runs
/// that never completed and for temporary file handling.
pub async fn compile(
    options: &CompilerOptions,
    input: &Path,
    output: Option<&Path>,
    observers: &[Arc<dyn RunObserver>],
) -> Result<CompileReport, CompileError> {
    let scratch = match output {
        Some(_) => None,
        None => Some(
            tempfile::Builder::new()
                .prefix("ksp-compiled-")
                .suffix(".txt")
                .tempfile()
                .map_err(CompileError::TempFile)?,
        ),
    };
    let target = output.or_else(|| scratch.as_ref().map(tempfile::NamedTempFile::path));

    let request = RunRequest::build(options, input, target);
    let mut observers = observers.to_vec();
    let echo = OutputEcho::new(options.show_stdout, options.show_stderr);
    if echo.is_active() {
        observers.push(Arc::new(echo));
    }

    let document = DocumentKey::from_path(input);
    tracing::info!(input = %input.display(), "Compiling");
    let report = exec::collect(&document, runner::run(request), &observers).await;

    let exit_code = match report.outcome {
        RunOutcome::Exited(code) => code,
        RunOutcome::Failed(e) => return Err(e.into()),
    };
    let mut notices = report.notices;

    let mut text = None;
    if exit_code == 0 {
        if let Some(scratch) = &scratch {
            let path = scratch.path();
            let compiled = tokio::fs::read_to_string(path).await.map_err(|source| {
                CompileError::ReadOutput {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            text = Some(compiled);
        }
        let message = match output {
            Some(output) => format!("Compiled {} to {}", input.display(), output.display()),
            None => format!("Compiled {}", input.display()),
        };
        notices.push(Notice::new(
            NoticeKind::CompileSucceeded,
            Some(document.clone()),
            message,
        ));
    } else {
        tracing::warn!(input = %input.display(), exit_code, "Compile failed");
    }

    Ok(CompileReport {
        document,
        exit_code,
        diagnostics: report.diagnostics,
        notices,
        text,
        output: output.map(Path::to_path_buf),
    })
}
