//! Core domain types for the KSP tools.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Both the validation pipeline and the symbol scanner build on these.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod diagnostic;
mod ids;
mod position;

pub use diagnostic::{Diagnostic, Severity};
pub use ids::DocumentKey;
pub use position::{END_OF_LINE, Position, Range};

/// Source label attached to diagnostics produced from compiler output.
pub const DIAGNOSTIC_SOURCE: &str = "ksp";
