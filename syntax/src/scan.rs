//! Declaration scanner.
//!
//! One pass over the document, one regular expression per declaration form:
//! `declare`, `on <callback>` and `function <name>`. A UI callback is linked
//! to the widget type of its control when that control was declared above it.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::symbol::{Symbol, SymbolKind, VariableType};

static DECLARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*declare\s+(ui_[a-zA-Z0-9_]+|const|polyphonic)?\s*([$%~?@!][a-zA-Z0-9_]+)")
        .expect("valid declare regex")
});

static CALLBACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*on\s+([a-zA-Z0-9_]+)(\s*\(\s*[^)]+\s*\))?").expect("valid callback regex")
});

static FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*function\s+([a-zA-Z0-9_]+)").expect("valid function regex")
});

/// Zero-based character column of byte offset `byte` in `text`.
pub(crate) fn char_column(text: &str, byte: usize) -> u32 {
    text[..byte].chars().count() as u32
}

/// Collect every declaration in `text`, in document order.
#[must_use]
pub fn collect(text: &str) -> Vec<Symbol> {
    let mut symbols = Vec::new();
    // Control name (with sigil) -> widget type, for linking UI callbacks.
    let mut ui_types: HashMap<String, String> = HashMap::new();

    for (index, line) in text.lines().enumerate() {
        let line_number = index as u32;
        if let Some(symbol) = scan_declare(line, line_number, &mut ui_types)
            .or_else(|| scan_callback(line, line_number, &ui_types))
            .or_else(|| scan_function(line, line_number))
        {
            symbols.push(symbol);
        }
    }
    symbols
}

fn scan_declare(
    line: &str,
    line_number: u32,
    ui_types: &mut HashMap<String, String>,
) -> Option<Symbol> {
    let caps = DECLARE.captures(line)?;
    let modifier = caps.get(1).map(|m| m.as_str());
    let name = caps.get(2)?;
    let sigil = name.as_str().chars().next()?;
    let ty = VariableType::from_sigil(sigil)?;

    let is_const = modifier == Some("const");
    let is_polyphonic = modifier == Some("polyphonic");
    let ui_type = modifier.filter(|m| m.starts_with("ui_")).map(str::to_string);

    let description = if is_const {
        format!("Constant Variable ({})", ty.type_name())
    } else if is_polyphonic {
        format!("Polyphonic Variable ({})", ty.type_name())
    } else if let Some(ui_type) = &ui_type {
        ui_types.insert(name.as_str().to_string(), ui_type.clone());
        format!("UI Variable ({ui_type})")
    } else {
        format!("Variable ({})", ty.type_name())
    };

    Some(Symbol {
        name: name.as_str()[sigil.len_utf8()..].to_string(),
        kind: SymbolKind::Variable(ty),
        is_const,
        is_polyphonic,
        is_ui: ui_type.is_some(),
        ui_type,
        ui_control: None,
        description,
        line: line_number,
        column: char_column(line, name.start()),
    })
}

fn scan_callback(
    line: &str,
    line_number: u32,
    ui_types: &HashMap<String, String>,
) -> Option<Symbol> {
    let caps = CALLBACK.captures(line)?;
    let name = caps.get(1)?;
    let control = caps
        .get(2)
        .filter(|_| name.as_str().starts_with("ui_"))
        .map(|arg| {
            arg.as_str()
                .trim()
                .trim_start_matches('(')
                .trim_end_matches(')')
                .trim()
                .to_string()
        });

    let description = match &control {
        Some(control) => format!("UI Callback for {control}"),
        None => "Callback".to_string(),
    };

    Some(Symbol {
        name: name.as_str().to_string(),
        kind: SymbolKind::Callback,
        is_const: false,
        is_polyphonic: false,
        is_ui: control.is_some(),
        ui_type: control.as_ref().and_then(|c| ui_types.get(c).cloned()),
        ui_control: control,
        description,
        line: line_number,
        column: char_column(line, name.start()),
    })
}

fn scan_function(line: &str, line_number: u32) -> Option<Symbol> {
    let caps = FUNCTION.captures(line)?;
    let name = caps.get(1)?;
    Some(Symbol {
        name: name.as_str().to_string(),
        kind: SymbolKind::UserFunction,
        is_const: false,
        is_polyphonic: false,
        is_ui: false,
        ui_type: None,
        ui_control: None,
        description: "Function".to_string(),
        line: line_number,
        column: char_column(line, name.start()),
    })
}
