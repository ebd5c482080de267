use serde::{Deserialize, Serialize};

/// Column sentinel meaning "until the end of the line".
///
/// The compiler only reports line numbers, so diagnostics cover the whole line.
pub const END_OF_LINE: u32 = u32::MAX;

/// A zero-based line/column position in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    #[must_use]
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A half-open span between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Span from column 0 to [`END_OF_LINE`] on `line`.
    #[must_use]
    pub const fn whole_line(line: u32) -> Self {
        Self {
            start: Position::new(line, 0),
            end: Position::new(line, END_OF_LINE),
        }
    }

    /// Span from `start` to the end of the same line.
    #[must_use]
    pub const fn to_end_of_line(start: Position) -> Self {
        Self {
            start,
            end: Position::new(start.line, END_OF_LINE),
        }
    }

    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }
}
