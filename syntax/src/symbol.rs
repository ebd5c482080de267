//! Symbol model for KSP declarations.

use ksp_types::Position;
use serde::Serialize;

/// Variable type, encoded in KSP by the first character of the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    Integer,
    Real,
    String,
    IntegerArray,
    RealArray,
    StringArray,
}

impl VariableType {
    #[must_use]
    pub fn from_sigil(sigil: char) -> Option<Self> {
        match sigil {
            '$' => Some(Self::Integer),
            '~' => Some(Self::Real),
            '@' => Some(Self::String),
            '%' => Some(Self::IntegerArray),
            '?' => Some(Self::RealArray),
            '!' => Some(Self::StringArray),
            _ => None,
        }
    }

    #[must_use]
    pub fn sigil(self) -> char {
        match self {
            Self::Integer => '$',
            Self::Real => '~',
            Self::String => '@',
            Self::IntegerArray => '%',
            Self::RealArray => '?',
            Self::StringArray => '!',
        }
    }

    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Integer => "Integer",
            Self::Real => "Real",
            Self::String => "String",
            Self::IntegerArray => "Integer Array",
            Self::RealArray => "Real Array",
            Self::StringArray => "String Array",
        }
    }

    #[must_use]
    pub fn is_array(self) -> bool {
        matches!(self, Self::IntegerArray | Self::RealArray | Self::StringArray)
    }
}

/// Whether `name` starts with a variable type sigil.
#[must_use]
pub fn is_variable_name(name: &str) -> bool {
    name.chars().next().and_then(VariableType::from_sigil).is_some()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "type", rename_all = "snake_case")]
pub enum SymbolKind {
    Variable(VariableType),
    Callback,
    UserFunction,
}

/// A declaration found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    /// Name without the type sigil.
    pub name: String,
    #[serde(flatten)]
    pub kind: SymbolKind,
    pub is_const: bool,
    pub is_polyphonic: bool,
    pub is_ui: bool,
    /// UI widget type (`ui_knob`, ...) of a UI variable, or of the control a
    /// UI callback handles when that control was declared earlier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_type: Option<String>,
    /// Control handled by a UI callback, sigil included (`$knob`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_control: Option<String>,
    /// Human-readable category, e.g. "Constant Variable (Integer)".
    pub description: String,
    /// Zero-based line of the declaration.
    pub line: u32,
    /// Zero-based column of the name (of the sigil for variables).
    pub column: u32,
}

impl Symbol {
    #[must_use]
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    #[must_use]
    pub fn variable_type(&self) -> Option<VariableType> {
        match self.kind {
            SymbolKind::Variable(ty) => Some(ty),
            SymbolKind::Callback | SymbolKind::UserFunction => None,
        }
    }

    /// The name as written in source: sigil + name for variables.
    #[must_use]
    pub fn source_name(&self) -> String {
        match self.kind {
            SymbolKind::Variable(ty) => format!("{}{}", ty.sigil(), self.name),
            SymbolKind::Callback | SymbolKind::UserFunction => self.name.clone(),
        }
    }

    #[must_use]
    pub fn is_ui_callback(&self) -> bool {
        self.kind == SymbolKind::Callback && self.is_ui
    }
}
