use std::path::Path;

use serde::Serialize;

use crate::position::Range;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error = 1,
    Warning = 2,
    Information = 3,
}

impl Severity {
    /// Map a compiler level word (`ERROR`, `WARNING`, `INFO`, `DEBUG`).
    ///
    /// Anything unrecognized is treated as an error so it is never hidden.
    #[must_use]
    pub fn from_level(level: &str) -> Self {
        match level {
            "WARNING" => Self::Warning,
            "INFO" | "DEBUG" => Self::Information,
            _ => Self::Error,
        }
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        self == Self::Error
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Information => "info",
        }
    }
}

/// A single diagnostic attached to a document line.
///
/// Fields are private; external consumers read via accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    severity: Severity,
    message: String,
    /// 0-indexed line number.
    line: u32,
    /// Column 0 to the end-of-line sentinel of `line`.
    range: Range,
    /// Producer of the diagnostic (e.g. "ksp").
    source: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(severity: Severity, message: String, line: u32, source: String) -> Self {
        Self {
            severity,
            message,
            line,
            range: Range::whole_line(line),
            source,
        }
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 0-indexed line number.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The whole reported line.
    #[must_use]
    pub fn range(&self) -> Range {
        self.range
    }

    /// Format as `path:line: severity: [source] message` (1-indexed for display).
    #[must_use]
    pub fn display_with_path(&self, path: &Path) -> String {
        format!(
            "{}:{}: {}: [{}] {}",
            path.display(),
            self.line + 1,
            self.severity.label(),
            self.source,
            self.message,
        )
    }
}
