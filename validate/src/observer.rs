//! Listener interface for compiler runs.

use ksp_types::DocumentKey;

/// Receives the lifecycle of every compiler run.
///
/// All methods default to no-ops. Calls happen on the run's task, in output
/// order; `on_run_end` fires once when stdout closes and `on_exit` fires
/// exactly once for every process that started.
pub trait RunObserver: Send + Sync {
    /// The process could not be found.
    fn on_error(&self, _document: &DocumentKey, _text: &str) {}

    /// The process failed to start or to be waited on.
    fn on_exception(&self, _document: &DocumentKey, _text: &str) {}

    fn on_stdout_line(&self, _document: &DocumentKey, _line: &str) {}

    fn on_stderr_line(&self, _document: &DocumentKey, _line: &str) {}

    fn on_run_end(&self, _document: &DocumentKey) {}

    fn on_exit(&self, _document: &DocumentKey, _code: i32) {}
}

/// Echoes compiler output to the log when enabled in the compiler options.
#[derive(Debug, Clone, Copy)]
pub struct OutputEcho {
    stdout: bool,
    stderr: bool,
}

impl OutputEcho {
    #[must_use]
    pub fn new(stdout: bool, stderr: bool) -> Self {
        Self { stdout, stderr }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.stdout || self.stderr
    }
}

impl RunObserver for OutputEcho {
    fn on_stdout_line(&self, document: &DocumentKey, line: &str) {
        if self.stdout {
            tracing::info!(target: "ksp::compiler", document = %document, "{line}");
        }
    }

    fn on_stderr_line(&self, document: &DocumentKey, line: &str) {
        if self.stderr {
            tracing::info!(target: "ksp::compiler", document = %document, stream = "stderr", "{line}");
        }
    }

    fn on_exit(&self, document: &DocumentKey, code: i32) {
        if self.is_active() {
            tracing::info!(target: "ksp::compiler", document = %document, code, "Compiler exited");
        }
    }
}
