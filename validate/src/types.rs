//! Public types consumed by the CLI and by editor integrations.
//!
//! Callers construct [`CompilerOptions`] and [`ValidateSettings`], feed
//! [`DocumentEvent`]s into the service, and read [`DiagnosticsSnapshot`]s,
//! [`RunSummary`]s and [`Notice`]s back out.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ksp_types::{Diagnostic, DocumentKey, Severity};
use serde::{Deserialize, Serialize};

use crate::error::RunError;

/// Live-validation delays below this are rejected.
pub const MIN_LIVE_DELAY_MS: u64 = 16;

/// Delay used when the configured one is missing or rejected.
pub const DEFAULT_LIVE_DELAY_MS: u64 = 500;

const DEFAULT_EXECUTABLE: &str = "python";

const DEFAULT_INDENT_SIZE: u32 = 4;

fn default_file_patterns() -> Vec<String> {
    vec!["*.ksp".to_string()]
}

/// Compiler invocation settings.
///
/// Snapshotted into a [`RunRequest`] at request time; later edits never
/// affect a run that was already requested.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Program to launch (usually a Python interpreter).
    pub executable: PathBuf,
    /// Compiler script passed as the first argument, if any.
    pub script: Option<PathBuf>,
    pub force: bool,
    pub compact: bool,
    pub compact_variables: bool,
    pub combine_callbacks: bool,
    pub extra_syntax_check: bool,
    pub optimize: bool,
    pub extra_branch_optimization: bool,
    pub indent_size: u32,
    pub add_compile_date: bool,
    pub sanitize_exit_command: bool,
    /// Echo compiler stdout to the log.
    pub show_stdout: bool,
    /// Echo compiler stderr to the log.
    pub show_stderr: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            script: None,
            force: false,
            compact: false,
            compact_variables: false,
            combine_callbacks: false,
            extra_syntax_check: false,
            optimize: false,
            extra_branch_optimization: false,
            indent_size: DEFAULT_INDENT_SIZE,
            add_compile_date: false,
            sanitize_exit_command: false,
            show_stdout: false,
            show_stderr: false,
        }
    }
}

/// Validation policy settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidateSettings {
    /// Master switch for validation. Default: false.
    pub enabled: bool,
    /// Validate while typing. Default: true.
    pub live: bool,
    /// Delay for live validation in milliseconds. Minimum: 16.
    pub delay_ms: u64,
    /// Glob patterns selecting which documents are validated.
    pub file_patterns: Vec<String>,
}

impl Default for ValidateSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            live: true,
            delay_ms: DEFAULT_LIVE_DELAY_MS,
            file_patterns: default_file_patterns(),
        }
    }
}

impl ValidateSettings {
    /// The configured live delay, or `None` when it is below the minimum.
    #[must_use]
    pub fn live_delay(&self) -> Option<Duration> {
        (self.delay_ms >= MIN_LIVE_DELAY_MS).then(|| Duration::from_millis(self.delay_ms))
    }
}

/// One fully-resolved compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub executable: PathBuf,
    pub args: Vec<OsString>,
}

impl RunRequest {
    /// Build the argument vector in the order the compiler expects:
    /// script, enabled flags, `--indent-size <n>`, trailing flags, input, output.
    #[must_use]
    pub fn build(options: &CompilerOptions, input: &Path, output: Option<&Path>) -> Self {
        let mut args: Vec<OsString> = Vec::new();
        if let Some(script) = &options.script {
            args.push(script.clone().into_os_string());
        }

        let leading = [
            (options.force, "--force"),
            (options.compact, "--compact"),
            (options.compact_variables, "--compact_variables"),
            (options.combine_callbacks, "--combine_callbacks"),
            (options.extra_syntax_check, "--extra_syntax_check"),
            (options.optimize, "--optimize"),
            (
                options.extra_branch_optimization,
                "--extra_branch_optimization",
            ),
        ];
        args.extend(
            leading
                .iter()
                .filter(|(enabled, _)| *enabled)
                .map(|(_, flag)| OsString::from(*flag)),
        );

        args.push("--indent-size".into());
        args.push(options.indent_size.to_string().into());

        if options.add_compile_date {
            args.push("--add_compile_date".into());
        }
        if options.sanitize_exit_command {
            args.push("--sanitize_exit_command".into());
        }

        args.push(input.as_os_str().to_os_string());
        if let Some(output) = output {
            args.push(output.as_os_str().to_os_string());
        }

        Self {
            executable: options.executable.clone(),
            args,
        }
    }
}

/// How a compiler invocation ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The process ran and exited. Unknown exit codes are reported as `-1`.
    Exited(i32),
    /// The process could not be started or waited on.
    Failed(RunError),
}

impl RunOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }

    /// Exit code, if the process ran.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exited(code) => Some(*code),
            Self::Failed(_) => None,
        }
    }
}

/// Lifecycle event reported by the host editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    Opened(DocumentKey),
    Saved(DocumentKey),
    Edited(DocumentKey),
    Closed(DocumentKey),
}

/// Category of a user-facing notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoticeKind {
    /// The compiler executable could not be found. Validation pauses.
    ExecutableNotFound,
    /// The process failed to start or could not be waited on.
    ExecutionError,
    /// The compiler exited with a nonzero code.
    CompileFailed { code: i32 },
    /// A compile command finished successfully.
    CompileSucceeded,
    /// The compiler reported an `Exception` block.
    Exception,
    /// The compiler reported a block of some other type.
    Fatal { label: String },
    /// A configuration value was rejected and replaced.
    ConfigWarning,
}

/// One-shot notification meant for the user, not attached to a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    #[serde(flatten)]
    pub kind: NoticeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentKey>,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn new(kind: NoticeKind, document: Option<DocumentKey>, message: impl Into<String>) -> Self {
        Self {
            kind,
            document,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        !matches!(
            self.kind,
            NoticeKind::CompileSucceeded | NoticeKind::ConfigWarning
        )
    }
}

/// Result of one completed validation run, as published to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub document: DocumentKey,
    /// Exit code of the compiler, `None` if it never ran to completion.
    pub exit_code: Option<i32>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Immutable snapshot of all published diagnostics, suitable for rendering.
///
/// Counts are computed from the canonical per-document lists.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsSnapshot {
    /// Per-document diagnostics, sorted with error-containing documents first.
    documents: Vec<(DocumentKey, Vec<Diagnostic>)>,
}

impl DiagnosticsSnapshot {
    pub(crate) fn new(documents: Vec<(DocumentKey, Vec<Diagnostic>)>) -> Self {
        Self { documents }
    }

    #[must_use]
    pub fn documents(&self) -> &[(DocumentKey, Vec<Diagnostic>)] {
        &self.documents
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn count_by_severity(&self, severity: Severity) -> usize {
        self.documents
            .iter()
            .flat_map(|(_, items)| items)
            .filter(|d| d.severity() == severity)
            .count()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count_by_severity(Severity::Error)
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count_by_severity(Severity::Warning)
    }

    #[must_use]
    pub fn info_count(&self) -> usize {
        self.count_by_severity(Severity::Information)
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.documents.iter().map(|(_, items)| items.len()).sum()
    }

    /// Format a compact status string like "E:3 W:5".
    #[must_use]
    pub fn status_string(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        format!("E:{} W:{}", self.error_count(), self.warning_count())
    }
}
