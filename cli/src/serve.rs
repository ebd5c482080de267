//! JSON-lines front end for editors.
//!
//! Every stdin line is one [`Request`] and every stdout line is one
//! [`Event`]. Diagnostics and notices are pushed as runs finish, so the
//! stream is not strictly request/response.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ksp_config::KspConfig;
use ksp_syntax::{LineEdit, Symbol};
use ksp_types::{DocumentKey, Position};
use ksp_validate::{
    CompilerOptions, DocumentEvent, Notice, RunSummary, ValidateSettings, ValidationService,
};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
enum Request {
    Open {
        path: PathBuf,
    },
    Save {
        path: PathBuf,
    },
    Edit {
        path: PathBuf,
    },
    Close {
        path: PathBuf,
    },
    /// The editor is about to save on its own behalf, e.g. after formatting.
    BeginSave {
        path: PathBuf,
    },
    EndSave {
        path: PathBuf,
    },
    /// Replace configuration; an absent table keeps the current one.
    Config {
        compiler: Option<CompilerOptions>,
        validate: Option<ValidateSettings>,
    },
    Symbols {
        path: PathBuf,
        text: Option<String>,
    },
    Definition {
        path: PathBuf,
        line: u32,
        character: u32,
        text: Option<String>,
    },
    References {
        path: PathBuf,
        line: u32,
        character: u32,
        text: Option<String>,
    },
    Rename {
        path: PathBuf,
        line: u32,
        character: u32,
        new_name: String,
        text: Option<String>,
    },
    Status,
    Shutdown,
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Event {
    Diagnostics(RunSummary),
    Notice(Notice),
    Symbols {
        document: DocumentKey,
        symbols: Vec<Symbol>,
    },
    Locations {
        document: DocumentKey,
        locations: Vec<Position>,
    },
    Edits {
        document: DocumentKey,
        edits: Vec<LineEdit>,
    },
    Status {
        status: String,
        errors: usize,
        warnings: usize,
    },
    Error {
        message: String,
    },
}

fn emit(event: &Event) -> Result<()> {
    let line = serde_json::to_string(event).context("failed to encode event")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}")?;
    stdout.flush()?;
    Ok(())
}

/// Serve until stdin closes or a `shutdown` request arrives.
pub async fn run(config: KspConfig) -> Result<()> {
    let mut service =
        ValidationService::new(config.compiler_options(), config.validate_settings());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    tracing::info!("Serving on stdio");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read request")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Request>(&line) {
                    Ok(Request::Shutdown) => break,
                    Ok(request) => match handle(&mut service, request) {
                        Ok(Some(event)) => emit(&event)?,
                        Ok(None) => {}
                        Err(err) => emit(&Event::Error { message: format!("{err:#}") })?,
                    },
                    Err(err) => emit(&Event::Error {
                        message: format!("invalid request: {err}"),
                    })?,
                }
            }
            Some(summary) = service.next_run() => emit(&Event::Diagnostics(summary))?,
        }

        for notice in service.drain_notices() {
            emit(&Event::Notice(notice))?;
        }
    }

    service.shutdown();
    Ok(())
}

fn document_text(path: &Path, text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
    }
}

fn handle(service: &mut ValidationService, request: Request) -> Result<Option<Event>> {
    let event = match request {
        Request::Open { path } => DocumentEvent::Opened(DocumentKey::from_path(&path)),
        Request::Save { path } => DocumentEvent::Saved(DocumentKey::from_path(&path)),
        Request::Edit { path } => DocumentEvent::Edited(DocumentKey::from_path(&path)),
        Request::Close { path } => DocumentEvent::Closed(DocumentKey::from_path(&path)),
        Request::BeginSave { path } => {
            service.begin_programmatic_save(&DocumentKey::from_path(&path));
            return Ok(None);
        }
        Request::EndSave { path } => {
            service.end_programmatic_save(&DocumentKey::from_path(&path));
            return Ok(None);
        }
        Request::Config { compiler, validate } => {
            let compiler = compiler.unwrap_or_else(|| service.compiler().clone());
            let validate = validate.unwrap_or_else(|| service.settings().clone());
            service.apply_config(compiler, validate);
            return Ok(None);
        }
        Request::Symbols { path, text } => {
            let text = document_text(&path, text)?;
            return Ok(Some(Event::Symbols {
                document: DocumentKey::from_path(&path),
                symbols: ksp_syntax::collect(&text),
            }));
        }
        Request::Definition {
            path,
            line,
            character,
            text,
        } => {
            let text = document_text(&path, text)?;
            return Ok(Some(Event::Locations {
                document: DocumentKey::from_path(&path),
                locations: ksp_syntax::definition(&text, Position::new(line, character)),
            }));
        }
        Request::References {
            path,
            line,
            character,
            text,
        } => {
            let text = document_text(&path, text)?;
            return Ok(Some(Event::Locations {
                document: DocumentKey::from_path(&path),
                locations: ksp_syntax::references(&text, Position::new(line, character)),
            }));
        }
        Request::Rename {
            path,
            line,
            character,
            new_name,
            text,
        } => {
            let text = document_text(&path, text)?;
            let edits = ksp_syntax::rename(&text, Position::new(line, character), &new_name)?;
            return Ok(Some(Event::Edits {
                document: DocumentKey::from_path(&path),
                edits,
            }));
        }
        Request::Status => {
            let snapshot = service.snapshot();
            return Ok(Some(Event::Status {
                status: snapshot.status_string(),
                errors: snapshot.error_count(),
                warnings: snapshot.warning_count(),
            }));
        }
        // Handled by the read loop.
        Request::Shutdown => return Ok(None),
    };
    service.handle(event);
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "on init\n    declare $count\nend on\n";

    fn service() -> ValidationService {
        ValidationService::new(CompilerOptions::default(), ValidateSettings::default())
    }

    fn parse(line: &str) -> Request {
        serde_json::from_str(line).unwrap()
    }

    // ── Requests ─────────────────────────────────────────────────────────

    #[test]
    fn test_parses_document_requests() {
        assert!(matches!(
            parse(r#"{"method":"open","path":"a.ksp"}"#),
            Request::Open { path } if path == Path::new("a.ksp")
        ));
        assert!(matches!(
            parse(r#"{"method":"begin_save","path":"a.ksp"}"#),
            Request::BeginSave { .. }
        ));
        assert!(matches!(parse(r#"{"method":"shutdown"}"#), Request::Shutdown));
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        assert!(serde_json::from_str::<Request>(r#"{"method":"format"}"#).is_err());
    }

    #[test]
    fn test_config_request_keeps_absent_tables() {
        let mut service = service();
        let request = parse(r#"{"method":"config","validate":{"enabled":true,"delay_ms":250}}"#);
        assert!(handle(&mut service, request).unwrap().is_none());
        assert!(service.settings().enabled);
        assert_eq!(service.settings().delay_ms, 250);
        assert_eq!(service.compiler(), &CompilerOptions::default());
    }

    #[test]
    fn test_open_with_validation_disabled_starts_nothing() {
        let mut service = service();
        let request = parse(r#"{"method":"open","path":"a.ksp"}"#);
        assert!(handle(&mut service, request).unwrap().is_none());
        assert!(service.session_state(&DocumentKey::new("a.ksp")).is_none());
    }

    // ── Navigation ───────────────────────────────────────────────────────

    #[test]
    fn test_symbols_from_inline_text() {
        let mut service = service();
        let request = Request::Symbols {
            path: PathBuf::from("a.ksp"),
            text: Some(SCRIPT.to_string()),
        };
        let Some(Event::Symbols { document, symbols }) = handle(&mut service, request).unwrap()
        else {
            panic!("expected symbols event");
        };
        assert_eq!(document.as_str(), "a.ksp");
        let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["init", "count"]);
    }

    #[test]
    fn test_symbols_for_missing_file_is_error() {
        let mut service = service();
        let dir = tempfile::tempdir().unwrap();
        let request = Request::Symbols {
            path: dir.path().join("absent.ksp"),
            text: None,
        };
        let err = handle(&mut service, request).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read"));
    }

    #[test]
    fn test_rename_of_keyword_is_error() {
        let mut service = service();
        let request = Request::Rename {
            path: PathBuf::from("a.ksp"),
            line: 1,
            character: 6,
            new_name: "x".to_string(),
            text: Some(SCRIPT.to_string()),
        };
        let err = handle(&mut service, request).unwrap_err();
        assert!(err.to_string().contains("keyword"));
    }

    #[test]
    fn test_rename_returns_line_edits() {
        let mut service = service();
        let request = Request::Rename {
            path: PathBuf::from("a.ksp"),
            line: 1,
            character: 14,
            new_name: "$total".to_string(),
            text: Some(SCRIPT.to_string()),
        };
        let Some(Event::Edits { edits, .. }) = handle(&mut service, request).unwrap() else {
            panic!("expected edits event");
        };
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "    declare $total");
    }

    // ── Events ───────────────────────────────────────────────────────────

    #[test]
    fn test_status_event_shape() {
        let mut service = service();
        let event = handle(&mut service, Request::Status).unwrap().unwrap();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "status");
        assert_eq!(json["errors"], 0);
        assert_eq!(json["status"], "");
    }

    #[test]
    fn test_error_event_shape() {
        let event = Event::Error {
            message: "bad".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({"event": "error", "message": "bad"}));
    }
}
