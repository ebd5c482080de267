//! Line grammars for compiler output.
//!
//! Two independent grammars:
//!
//! - stdout: one diagnostic per line, `LEVEL path:line: message`.
//! - stderr: multi-line blocks opened by `>>> BEGIN <Type>` and closed by
//!   `>>> END <Type>`, carrying `>>> Command:` / `>>> Location:` fields and
//!   free-form message lines.
//!
//! Lines that match neither grammar are reported as unmatched and ignored by
//! callers.

use std::sync::LazyLock;

use ksp_types::{DIAGNOSTIC_SOURCE, Diagnostic, Severity};
use regex::Regex;

use crate::types::NoticeKind;

static STDOUT_DIAGNOSTIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]+)\s+(.+):(\d+):\s*(.*)$").expect("valid stdout diagnostic regex")
});

static BLOCK_BEGIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^>>> BEGIN\s+(.+?)\s*$").expect("valid block begin regex"));

static BLOCK_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^>>> END\s+(.+?)\s*$").expect("valid block end regex"));

static BLOCK_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^>>> Command:\s*(.*?)\s*$").expect("valid command regex"));

static BLOCK_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^>>> Location:\s*(.*?):\s*(\d+)\s*$").expect("valid location regex")
});

// Single-line fatal messages from the older Java-based parser.
static LEGACY_LEXICAL_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"TokenMgrError: Lexical error at line (\d+)").expect("valid lexical error regex")
});

static LEGACY_PARSE_EXCEPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ParseException:.*?at line (\d+)").expect("valid parse exception regex")
});

const LEGACY_FATAL_MESSAGE: &str = "FATAL: Check your script carefully again.";

const BLOCK_TYPE_ERROR: &str = "Error";
const BLOCK_TYPE_EXCEPTION: &str = "Exception";

/// Classification of one stdout line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdoutLine {
    Diagnostic(Diagnostic),
    Unmatched,
}

/// Something produced by the stderr grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StderrItem {
    Diagnostic(Diagnostic),
    Notice { kind: NoticeKind, message: String },
}

/// Convert a 1-based compiler line number to 0-based.
fn zero_based(raw: &str) -> Option<u32> {
    raw.parse::<u32>().ok().map(|n| n.saturating_sub(1))
}

fn diagnostic(severity: Severity, message: String, line: u32) -> Diagnostic {
    Diagnostic::new(severity, message, line, DIAGNOSTIC_SOURCE.to_string())
}

/// Classify one stdout line against `LEVEL path:line: message`.
///
/// ERROR maps to Error, WARNING to Warning, INFO/DEBUG to Information, and
/// any other level to Error.
#[must_use]
pub fn classify_stdout(line: &str) -> StdoutLine {
    let Some(caps) = STDOUT_DIAGNOSTIC.captures(line) else {
        return StdoutLine::Unmatched;
    };
    let Some(line_number) = zero_based(&caps[3]) else {
        return StdoutLine::Unmatched;
    };
    StdoutLine::Diagnostic(diagnostic(
        Severity::from_level(&caps[1]),
        caps[4].to_string(),
        line_number,
    ))
}

/// Fields accumulated between `>>> BEGIN` and `>>> END`.
#[derive(Debug, Default)]
struct ErrorBlock {
    kind: String,
    command: Option<String>,
    file: Option<String>,
    line: Option<u32>,
    message: Vec<String>,
}

impl ErrorBlock {
    fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            ..Self::default()
        }
    }

    fn message_text(&self) -> String {
        let text = self.message.join("\n");
        let text = text.trim();
        if text.is_empty() {
            format!("Compiler reported {}", self.kind)
        } else {
            text.to_string()
        }
    }

    /// Message with the failing command and location appended, for notices.
    fn notice_text(&self) -> String {
        let mut text = self.message_text();
        if let Some(command) = &self.command {
            text.push_str(&format!("\nCommand: {command}"));
        }
        if let (Some(file), Some(line)) = (&self.file, self.line) {
            text.push_str(&format!("\nLocation: {file}:{}", line + 1));
        }
        text
    }

    fn close(self) -> StderrItem {
        match self.kind.as_str() {
            BLOCK_TYPE_ERROR => match self.line {
                Some(line) => StderrItem::Diagnostic(diagnostic(
                    Severity::Error,
                    self.message_text(),
                    line,
                )),
                None => StderrItem::Notice {
                    kind: NoticeKind::Fatal {
                        label: BLOCK_TYPE_ERROR.to_string(),
                    },
                    message: self.notice_text(),
                },
            },
            BLOCK_TYPE_EXCEPTION => StderrItem::Notice {
                kind: NoticeKind::Exception,
                message: self.notice_text(),
            },
            other => StderrItem::Notice {
                kind: NoticeKind::Fatal {
                    label: other.to_string(),
                },
                message: self.notice_text(),
            },
        }
    }
}

/// Incremental state machine over stderr lines.
///
/// Feed lines in delivery order; each completed block yields one item.
#[derive(Debug, Default)]
pub struct StderrClassifier {
    block: Option<ErrorBlock>,
}

impl StderrClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line. Returns an item when a block closes or a legacy
    /// single-line fatal message is recognized.
    pub fn feed(&mut self, line: &str) -> Option<StderrItem> {
        if let Some(caps) = BLOCK_BEGIN.captures(line) {
            if let Some(dropped) = self.block.replace(ErrorBlock::new(&caps[1])) {
                tracing::debug!(kind = %dropped.kind, "Discarding unterminated error block");
            }
            return None;
        }

        let Some(block) = self.block.as_mut() else {
            return classify_legacy_stderr(line);
        };

        if let Some(caps) = BLOCK_END.captures(line)
            && caps[1] == block.kind
        {
            return self.block.take().map(ErrorBlock::close);
        }

        if let Some(caps) = BLOCK_COMMAND.captures(line) {
            block.command = Some(caps[1].to_string());
        } else if let Some(caps) = BLOCK_LOCATION.captures(line) {
            block.file = Some(caps[1].to_string());
            block.line = zero_based(&caps[2]);
        } else {
            block.message.push(line.to_string());
        }
        None
    }

    /// Whether a block is open and waiting for its end marker.
    #[must_use]
    pub fn in_block(&self) -> bool {
        self.block.is_some()
    }

    /// End of stream. An unterminated block is dropped without output.
    pub fn finish(&mut self) {
        if let Some(block) = self.block.take() {
            tracing::debug!(kind = %block.kind, "Stream ended inside an unterminated error block");
        }
    }
}

fn classify_legacy_stderr(line: &str) -> Option<StderrItem> {
    let caps = LEGACY_LEXICAL_ERROR
        .captures(line)
        .or_else(|| LEGACY_PARSE_EXCEPTION.captures(line))?;
    let line_number = zero_based(&caps[1])?;
    Some(StderrItem::Diagnostic(diagnostic(
        Severity::Error,
        LEGACY_FATAL_MESSAGE.to_string(),
        line_number,
    )))
}
