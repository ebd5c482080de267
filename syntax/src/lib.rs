//! Line-oriented analysis of KSP sources.
//!
//! There is no grammar here: declarations are recognized one line at a time
//! by regular expressions, and navigation works on whole tokens.

mod navigate;
mod scan;
mod symbol;
pub mod text_utils;

pub use navigate::{LineEdit, RenameError, definition, references, rename};
pub use scan::collect;
pub use symbol::{Symbol, SymbolKind, VariableType, is_variable_name};
pub use text_utils::{BASIC_KEYWORDS, is_keyword, is_literal, symbol_at};
