//! Error taxonomy for compiler invocations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to run the compiler process to completion.
///
/// A nonzero exit code is not a `RunError`; it is a normal outcome that the
/// compiler uses to signal a failed compile.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("executable '{}' not found", .program.display())]
    ExecutableNotFound { program: PathBuf },
    #[error("failed to start '{}': {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed waiting for compiler process: {0}")]
    Wait(#[source] io::Error),
}

impl RunError {
    /// Whether the process never started, i.e. the environment is broken
    /// rather than the script.
    #[must_use]
    pub fn is_setup_failure(&self) -> bool {
        matches!(self, Self::ExecutableNotFound { .. } | Self::Spawn { .. })
    }
}

/// Failure of the one-shot compile command.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Run(#[from] RunError),
    #[error("compile failed with exit code {code}")]
    Failed { code: i32 },
    #[error("creating temporary output file: {0}")]
    TempFile(#[source] io::Error),
    #[error("reading compiled output {}: {source}", .path.display())]
    ReadOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
