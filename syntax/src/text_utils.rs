//! Word extraction and token classification.

use std::sync::LazyLock;

use regex::Regex;

/// Reserved words that can never be renamed.
pub const BASIC_KEYWORDS: &[&str] = &[
    "on", "end", "function", "declare", "const", "polyphonic", "if", "else", "select", "case",
    "to", "while", "mod", "and", "or", "not", ".and.", ".or.", ".not.", "call",
];

static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0|[1-9][0-9]*)$").expect("valid decimal regex"));

// KSP hex literals look like `9FFh`.
static HEXADECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^9[0-9a-fA-F]*h$").expect("valid hexadecimal regex"));

static REAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0|[1-9][0-9]*)\.[0-9]*$").expect("valid real regex"));

static STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"[^"]*"$"#).expect("valid string literal regex"));

/// Characters that end a symbol when scanning left or right from a cursor.
fn is_boundary(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '(' | ')' | '{' | '}' | ':' | '[' | ']' | ',' | '+' | '-' | '/' | '*' | '<' | '>'
                | '^' | '"'
        )
}

/// The symbol under `character` (a zero-based char column) in `line`.
///
/// A string literal boundary is kept, so the result for a cursor inside
/// `"abc"` starts or ends with a quote and classifies as a literal.
#[must_use]
pub fn symbol_at(line: &str, character: u32) -> String {
    let chars: Vec<char> = line.chars().collect();
    let cursor = (character as usize).min(chars.len());

    let mut end = cursor;
    let mut closing_quote = false;
    while end < chars.len() {
        if is_boundary(chars[end]) {
            closing_quote = chars[end] == '"';
            break;
        }
        end += 1;
    }

    let mut start = cursor;
    let mut opening_quote = false;
    while start > 0 {
        if is_boundary(chars[start - 1]) {
            opening_quote = chars[start - 1] == '"';
            break;
        }
        start -= 1;
    }

    let mut symbol = String::new();
    if opening_quote {
        symbol.push('"');
    }
    symbol.extend(&chars[start..end]);
    if closing_quote {
        symbol.push('"');
    }
    symbol.trim().to_string()
}

#[must_use]
pub fn is_keyword(text: &str) -> bool {
    BASIC_KEYWORDS.contains(&text)
}

/// Decimal, hexadecimal, real or string literal.
#[must_use]
pub fn is_literal(text: &str) -> bool {
    DECIMAL.is_match(text)
        || HEXADECIMAL.is_match(text)
        || REAL.is_match(text)
        || STRING.is_match(text)
}

/// Whether `c` can be part of an identifier, sigil excluded.
pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
