//! Go-to-definition, find-references and rename over a single document.

use ksp_types::{Position, Range};
use serde::Serialize;
use thiserror::Error;

use crate::scan::{char_column, collect};
use crate::symbol::{Symbol, SymbolKind, is_variable_name};
use crate::text_utils::{is_identifier_char, is_keyword, is_literal, symbol_at};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenameError {
    #[error("new name is empty")]
    EmptyName,
    #[error("no symbol at the requested position")]
    NoSymbol,
    #[error("'{0}' is a keyword and cannot be renamed")]
    Keyword(String),
    #[error("'{0}' is a literal and cannot be renamed")]
    Literal(String),
}

/// Replacement of one whole line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineEdit {
    pub range: Range,
    pub new_text: String,
}

fn word_at(text: &str, position: Position) -> Option<String> {
    let line = text.lines().nth(position.line as usize)?;
    let word = symbol_at(line, position.character);
    (!word.is_empty()).then_some(word)
}

/// Byte ranges of `word` in `line` that are whole tokens.
fn occurrences(line: &str, word: &str) -> Vec<std::ops::Range<usize>> {
    line.match_indices(word)
        .filter(|(start, _)| {
            let end = start + word.len();
            let before_ok = line[..*start]
                .chars()
                .next_back()
                .is_none_or(|c| !is_identifier_char(c) && !is_variable_name(&c.to_string()));
            let after_ok = line[end..]
                .chars()
                .next()
                .is_none_or(|c| !is_identifier_char(c));
            before_ok && after_ok
        })
        .map(|(start, _)| start..start + word.len())
        .collect()
}

fn is_declared_name(symbols: &[Symbol], word: &str) -> bool {
    symbols.iter().any(|s| s.source_name() == word)
}

/// Declarations of the symbol under `position`.
///
/// The declaration on the cursor's own line is skipped. For a UI variable,
/// the UI callbacks handling that control are returned as well.
#[must_use]
pub fn definition(text: &str, position: Position) -> Vec<Position> {
    let Some(word) = word_at(text, position) else {
        return Vec::new();
    };
    let symbols = collect(text);
    let mut result = Vec::new();

    for symbol in &symbols {
        let declared_here = symbol.line == position.line;
        if symbol.source_name() != word {
            continue;
        }
        if !declared_here {
            result.push(symbol.position());
        }
        if matches!(symbol.kind, SymbolKind::Variable(_)) && symbol.is_ui {
            result.extend(
                symbols
                    .iter()
                    .filter(|cb| cb.is_ui_callback() && cb.ui_control.as_deref() == Some(&word))
                    .map(Symbol::position),
            );
        }
    }
    result
}

/// Every occurrence of the user-declared symbol under `position`,
/// declaration included.
#[must_use]
pub fn references(text: &str, position: Position) -> Vec<Position> {
    let Some(word) = word_at(text, position) else {
        return Vec::new();
    };
    if !is_declared_name(&collect(text), &word) {
        return Vec::new();
    }

    let mut result = Vec::new();
    for (index, line) in text.lines().enumerate() {
        for range in occurrences(line, &word) {
            result.push(Position::new(index as u32, char_column(line, range.start)));
        }
    }
    result
}

/// Line edits renaming the symbol under `position` to `new_name` everywhere
/// in the document.
pub fn rename(text: &str, position: Position, new_name: &str) -> Result<Vec<LineEdit>, RenameError> {
    if new_name.is_empty() {
        return Err(RenameError::EmptyName);
    }
    let word = word_at(text, position).ok_or(RenameError::NoSymbol)?;
    if !is_variable_name(&word) {
        if is_keyword(&word) {
            return Err(RenameError::Keyword(word));
        }
        if is_literal(&word) {
            return Err(RenameError::Literal(word));
        }
    }

    let mut edits = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let ranges = occurrences(line, &word);
        if ranges.is_empty() {
            continue;
        }
        let mut new_text = String::with_capacity(line.len());
        let mut last = 0;
        for range in ranges {
            new_text.push_str(&line[last..range.start]);
            new_text.push_str(new_name);
            last = range.end;
        }
        new_text.push_str(&line[last..]);

        let line_number = index as u32;
        edits.push(LineEdit {
            range: Range::new(
                Position::new(line_number, 0),
                Position::new(line_number, line.chars().count() as u32),
            ),
            new_text,
        });
    }
    Ok(edits)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "\
on init
    declare $count
    declare $counter
    declare ui_knob $volume (0, 100, 1)
end on

function reset
    $count := 0
    $counter := 0
end function

on ui_control ($volume)
    call reset
    message($count)
end on
";

    // ── definition ─────────────────────────────────────────────────────

    #[test]
    fn test_definition_of_variable_use() {
        // `$count` on line 7
        let found = definition(SCRIPT, Position::new(7, 6));
        assert_eq!(found, [Position::new(1, 12)]);
    }

    #[test]
    fn test_definition_skips_own_declaration_line() {
        assert!(definition(SCRIPT, Position::new(1, 13)).is_empty());
    }

    #[test]
    fn test_definition_of_function_call() {
        let found = definition(SCRIPT, Position::new(12, 10));
        assert_eq!(found, [Position::new(6, 9)]);
    }

    #[test]
    fn test_definition_of_ui_variable_includes_callback() {
        let found = definition(SCRIPT, Position::new(11, 17));
        assert_eq!(found, [Position::new(3, 20), Position::new(11, 3)]);
    }

    #[test]
    fn test_definition_of_unknown_word_is_empty() {
        assert!(definition(SCRIPT, Position::new(13, 6)).is_empty());
        assert!(definition(SCRIPT, Position::new(99, 0)).is_empty());
    }

    // ── references ─────────────────────────────────────────────────────

    #[test]
    fn test_references_are_whole_tokens() {
        let found = references(SCRIPT, Position::new(1, 13));
        assert_eq!(
            found,
            [
                Position::new(1, 12),
                Position::new(7, 4),
                Position::new(13, 12)
            ]
        );
    }

    #[test]
    fn test_references_of_undeclared_word_are_empty() {
        assert!(references(SCRIPT, Position::new(13, 6)).is_empty());
    }

    // ── rename ─────────────────────────────────────────────────────────

    #[test]
    fn test_rename_variable_rewrites_every_line() {
        let edits = rename(SCRIPT, Position::new(7, 5), "$total").unwrap();
        let lines: Vec<(u32, &str)> = edits
            .iter()
            .map(|e| (e.range.start.line, e.new_text.as_str()))
            .collect();
        assert_eq!(
            lines,
            [
                (1, "    declare $total"),
                (7, "    $total := 0"),
                (13, "    message($total)")
            ]
        );
        assert_eq!(edits[0].range.end, Position::new(1, 18));
    }

    #[test]
    fn test_rename_function() {
        let edits = rename(SCRIPT, Position::new(6, 10), "clear").unwrap();
        let texts: Vec<&str> = edits.iter().map(|e| e.new_text.as_str()).collect();
        assert_eq!(texts, ["function clear", "    call clear"]);
    }

    #[test]
    fn test_rename_refuses_keywords_and_literals() {
        assert_eq!(
            rename(SCRIPT, Position::new(1, 5), "x"),
            Err(RenameError::Keyword("declare".to_string()))
        );
        assert_eq!(
            rename(SCRIPT, Position::new(7, 14), "x"),
            Err(RenameError::Literal("0".to_string()))
        );
    }

    #[test]
    fn test_rename_requires_name_and_symbol() {
        assert_eq!(
            rename(SCRIPT, Position::new(7, 5), ""),
            Err(RenameError::EmptyName)
        );
        assert_eq!(
            rename(SCRIPT, Position::new(4, 0), "x"),
            Err(RenameError::Keyword("end".to_string()))
        );
        assert_eq!(
            rename("", Position::new(0, 0), "x"),
            Err(RenameError::NoSymbol)
        );
    }
}
