//! Query splitter
//!
//! Splits ggsql queries into SQL and visualization portions, and injects
//! `SELECT * FROM <source>` when `VISUALISE FROM` is used.
//!
//! The split point is the first `VISUALISE`/`VISUALIZE` keyword that sits at
//! parenthesis depth zero, outside string literals, quoted identifiers and
//! comments. Nothing else about the SQL is interpreted.

use super::source_tree::{words_with_offsets, SourceTree};
use crate::{GgsqlError, Result};
use serde::Serialize;
use tracing::debug;

/// Result of splitting a ggsql query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitResult {
    /// SQL to execute. Equal to the trimmed text before the keyword unless
    /// `VISUALISE FROM` injected a `SELECT`.
    pub sql: String,
    /// Everything from the keyword onward, trimmed. Empty without a VISUALISE.
    pub visual: String,
}

impl SplitResult {
    pub fn has_visual(&self) -> bool {
        !self.visual.is_empty()
    }
}

/// Statement keywords that end a CTE-only `WITH` prefix
const STATEMENT_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "INSERT", "UPDATE", "DELETE", "VALUES", "TABLE", "CREATE", "DROP", "ALTER",
    "SHOW", "DESCRIBE", "PIVOT", "UNPIVOT", "UNION", "WHERE", "ORDER", "LIMIT",
];

// =============================================================================
// Scanner
// =============================================================================

/// Walks SQL text and yields code bytes (outside strings, quoted identifiers
/// and comments) together with the parenthesis depth they sit at.
struct CodeScanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> CodeScanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
            depth: 0,
        }
    }

    fn skip_quoted(&mut self, quote: u8) {
        self.pos += 1;
        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] == quote {
                if self.bytes.get(self.pos + 1) == Some(&quote) {
                    self.pos += 2;
                    continue;
                }
                self.pos += 1;
                return;
            }
            self.pos += 1;
        }
    }
}

impl Iterator for CodeScanner<'_> {
    /// (byte offset, byte, depth)
    type Item = (usize, u8, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let b = *self.bytes.get(self.pos)?;
            let next = self.bytes.get(self.pos + 1).copied();
            match (b, next) {
                (b'\'', _) | (b'"', _) => self.skip_quoted(b),
                (b'-', Some(b'-')) => {
                    while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                (b'/', Some(b'*')) => {
                    self.pos += 2;
                    while self.pos < self.bytes.len()
                        && !(self.bytes[self.pos] == b'*'
                            && self.bytes.get(self.pos + 1) == Some(&b'/'))
                    {
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 2).min(self.bytes.len());
                }
                _ => {
                    let at = self.pos;
                    self.pos += 1;
                    match b {
                        b'(' => {
                            self.depth += 1;
                            return Some((at, b, self.depth - 1));
                        }
                        b')' => {
                            self.depth = self.depth.saturating_sub(1);
                            return Some((at, b, self.depth));
                        }
                        _ => return Some((at, b, self.depth)),
                    }
                }
            }
        }
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

/// Top-level words of `text` (depth 0, outside strings and comments)
fn top_level_words(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    for (at, b, depth) in CodeScanner::new(text) {
        if depth == 0 && is_ident_byte(b) {
            match current {
                Some((start, end)) if end == at => current = Some((start, at + 1)),
                Some((start, end)) => {
                    words.push(&text[start..end]);
                    current = Some((at, at + 1));
                }
                None => current = Some((at, at + 1)),
            }
        }
    }
    if let Some((start, end)) = current {
        words.push(&text[start..end]);
    }
    words
}

/// Byte offset of the first top-level VISUALISE/VISUALIZE keyword
pub(crate) fn find_visualise(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    for (at, _, depth) in CodeScanner::new(text) {
        if depth != 0 || at + 9 > bytes.len() {
            continue;
        }
        let word = &bytes[at..at + 9];
        let matches_keyword =
            word.eq_ignore_ascii_case(b"VISUALISE") || word.eq_ignore_ascii_case(b"VISUALIZE");
        if !matches_keyword {
            continue;
        }
        let boundary_before = at == 0 || !is_ident_byte(bytes[at - 1]);
        let boundary_after = bytes.get(at + 9).map_or(true, |b| !is_ident_byte(*b));
        // `t.visualise` is a qualified column, not the keyword
        let qualified = bytes[..at]
            .iter()
            .rev()
            .find(|b| !b.is_ascii_whitespace())
            == Some(&b'.');
        if boundary_before && boundary_after && !qualified {
            return Some(at);
        }
    }
    None
}

/// True for `WITH a AS (...), b AS (...)` with no main statement after it
fn is_cte_only_prefix(sql: &str) -> bool {
    let words = top_level_words(sql);
    let Some(first) = words.first() else {
        return false;
    };
    first.eq_ignore_ascii_case("WITH")
        && sql.trim_end().ends_with(')')
        && !words[1..].iter().any(|w| {
            STATEMENT_KEYWORDS
                .iter()
                .any(|kw| w.eq_ignore_ascii_case(kw))
        })
}

/// Table reference following `VISUALISE FROM`, as written
///
/// Returns `Ok(None)` when the visual text does not start with
/// `VISUALISE FROM`.
fn from_source(visual: &str) -> Result<Option<String>> {
    let words = words_with_offsets(visual);
    match words.get(1) {
        Some((_, word)) if word.eq_ignore_ascii_case("FROM") => {}
        _ => return Ok(None),
    }

    let rest = visual.get(words[1].0 + 4..).unwrap_or_default().trim_start();
    let tree = SourceTree::new(visual)?;
    // Error recovery may find a table further on; only the next token counts
    match tree.visualise_source() {
        Some(source) if !source.is_empty() && rest.starts_with(&source) => Ok(Some(source)),
        _ => {
            let after: String = rest
                .chars()
                .take(20)
                .collect();
            Err(GgsqlError::ParseError(format!(
                "VISUALISE FROM requires a table reference, found '{}'",
                after
            )))
        }
    }
}

/// Last ~40 characters of the offending SQL, for error messages
fn error_fragment(sql: &str) -> String {
    let chars: Vec<char> = sql.chars().collect();
    let start = chars.len().saturating_sub(40);
    chars[start..].iter().collect()
}

// =============================================================================
// Public API
// =============================================================================

/// Split a ggsql query into SQL and visualization portions
///
/// Without `VISUALISE FROM`, `sql` is the trimmed text before the keyword and
/// `visual` the trimmed text from the keyword on. With `VISUALISE FROM <t>`,
/// `SELECT * FROM <t>` is appended to whatever SQL precedes it; that SQL must
/// be empty, end with `;`, or be a CTE-only `WITH` prefix.
pub fn split_query(query: &str) -> Result<SplitResult> {
    let Some(at) = find_visualise(query) else {
        debug!("No VISUALISE clause found, treating input as plain SQL");
        return Ok(SplitResult {
            sql: query.trim().to_string(),
            visual: String::new(),
        });
    };

    let sql = query[..at].trim();
    let visual = query[at..].trim();

    let Some(source) = from_source(visual)? else {
        debug!(sql_len = sql.len(), visual_len = visual.len(), "Split query");
        return Ok(SplitResult {
            sql: sql.to_string(),
            visual: visual.to_string(),
        });
    };

    let sql = if sql.is_empty() {
        format!("SELECT * FROM {}", source)
    } else if sql.ends_with(';') || is_cte_only_prefix(sql) {
        format!("{} SELECT * FROM {}", sql, source)
    } else {
        return Err(GgsqlError::ParseError(format!(
            "Error parsing VISUALISE statement near '{}'. Did you forget a semicolon?",
            error_fragment(sql)
        )));
    };

    debug!(%source, "Injected SELECT for VISUALISE FROM");
    Ok(SplitResult {
        sql,
        visual: visual.to_string(),
    })
}

/// Split SQL into statements at top-level semicolons
///
/// Semicolons inside strings, quoted identifiers, comments and parentheses
/// do not split. Empty statements are dropped.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut start = 0;
    for (at, b, depth) in CodeScanner::new(sql) {
        if b == b';' && depth == 0 {
            let stmt = sql[start..at].trim();
            if !stmt.is_empty() {
                statements.push(stmt.to_string());
            }
            start = at + 1;
        }
    }
    let tail = sql[start..].trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }
    statements
}
