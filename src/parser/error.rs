//! Parser error types
//!
//! Grammar errors carry a position inside the visualisation text so callers
//! can point at the offending clause.

use std::fmt;

/// Parse error with location information
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred (0-based)
    pub line: usize,
    /// Column number where the error occurred (0-based)
    pub column: usize,
    /// Grammar rule being parsed, e.g. "DRAW clause"
    pub context: String,
}

impl ParseError {
    pub fn new(
        message: impl Into<String>,
        line: usize,
        column: usize,
        context: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            context: context.into(),
        }
    }

    /// Parse error pointing at a byte offset of `source`
    pub fn at_offset(
        message: impl Into<String>,
        source: &str,
        offset: usize,
        context: impl Into<String>,
    ) -> Self {
        let (line, column) = line_column(source, offset);
        Self::new(message, line, column, context)
    }
}

/// Convert a byte offset into a 0-based (line, column) pair. Columns count
/// characters, not bytes.
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut end = offset.min(source.len());
    while !source.is_char_boundary(end) {
        end -= 1;
    }
    let before = &source[..end];
    let line = before.matches('\n').count();
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    (line, before[line_start..].chars().count())
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {} (in {})",
            self.message,
            self.line + 1,
            self.column + 1,
            self.context
        )
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for crate::GgsqlError {
    fn from(err: ParseError) -> Self {
        crate::GgsqlError::ParseError(err.to_string())
    }
}
