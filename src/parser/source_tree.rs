//! Tree-sitter source tree wrapper with declarative query support.
//!
//! `SourceTree` keeps a tree-sitter parse tree together with the text and
//! language it came from, so node lookups and text extraction go through one
//! place.

use super::error::ParseError;
use crate::plot::{Aesthetic, Geom};
use crate::{GgsqlError, Result};
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, StreamingIterator, Tree};

/// A parsed ggsql text
#[derive(Debug)]
pub struct SourceTree<'a> {
    pub tree: Tree,
    pub source: &'a str,
    pub language: Language,
}

impl<'a> SourceTree<'a> {
    /// Parse source and create a new SourceTree
    pub fn new(source: &'a str) -> Result<Self> {
        let language = tree_sitter_ggsql::language();

        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| GgsqlError::InternalError(format!("Failed to set language: {}", e)))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| GgsqlError::ParseError("Failed to parse query".to_string()))?;

        Ok(Self {
            tree,
            source,
            language,
        })
    }

    /// Get the root node
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Extract text from a node
    pub fn get_text(&self, node: &Node) -> String {
        self.source[node.start_byte()..node.end_byte()].to_string()
    }

    /// Find all nodes matching a tree-sitter query
    pub fn find_nodes<'b>(&self, node: &Node<'b>, query_source: &str) -> Vec<Node<'b>> {
        let query = match Query::new(&self.language, query_source) {
            Ok(q) => q,
            Err(_) => return Vec::new(),
        };

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, *node, self.source.as_bytes());

        let mut results = Vec::new();
        while let Some(match_result) = matches.next() {
            for capture in match_result.captures {
                results.push(capture.node);
            }
        }
        results
    }

    /// Find first node matching query
    pub fn find_node<'b>(&self, node: &Node<'b>, query_source: &str) -> Option<Node<'b>> {
        let query = match Query::new(&self.language, query_source) {
            Ok(q) => q,
            Err(_) => return None,
        };

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, *node, self.source.as_bytes());

        if let Some(match_result) = matches.next() {
            if let Some(capture) = match_result.captures.first() {
                return Some(capture.node);
            }
        }
        None
    }

    /// Find first node text matching query
    pub fn find_text(&self, node: &Node, query: &str) -> Option<String> {
        self.find_node(node, query).map(|n| self.get_text(&n))
    }

    /// Every `visualise_statement` in the text, in order
    pub fn visualise_statements(&self) -> Vec<Node<'_>> {
        self.find_nodes(&self.root(), "(visualise_statement) @viz")
    }

    /// Table reference of `VISUALISE FROM <table>`, as written
    pub fn visualise_source(&self) -> Option<String> {
        let from_query = r#"
            (visualise_statement
              (from_clause
                (table_ref) @table))
        "#;
        let root = self.root();
        self.find_text(&root, from_query)
            .or_else(|| {
                // Grammars without a table_ref node keep the name in from_clause
                let clause = self.find_text(&root, "(from_clause) @from")?;
                let words = words_with_offsets(&clause);
                let (offset, _) = words.get(1)?;
                Some(clause[*offset..].to_string())
            })
            .map(|t| t.trim().to_string())
    }

    /// The first syntax error in the tree, if any
    pub fn syntax_error(&self) -> Option<ParseError> {
        let root = self.root();
        if !root.has_error() {
            return None;
        }
        let node = first_error(root)?;
        Some(self.describe_error(&node))
    }

    fn describe_error(&self, node: &Node) -> ParseError {
        let context = enclosing_clause(node);
        if node.is_missing() {
            return ParseError::at_offset(
                format!("Incomplete {}: expected {}", context, node.kind().replace('_', " ")),
                self.source,
                node.start_byte(),
                context,
            );
        }

        // Name the offending word when it follows DRAW or AS
        let window_start = previous_word_start(self.source, node.start_byte());
        let window = &self.source[window_start..node.end_byte()];
        let words = words_with_offsets(window);
        for pair in words.windows(2) {
            let ((_, keyword), (offset, word)) = (pair[0], pair[1]);
            let offset = window_start + offset;
            if keyword.eq_ignore_ascii_case("DRAW") && Geom::from_name(word).is_none() {
                return ParseError::at_offset(
                    format!(
                        "Unknown mark '{}'. Expected one of: {}",
                        word,
                        Geom::names().join(", ")
                    ),
                    self.source,
                    offset,
                    "DRAW clause",
                );
            }
            if keyword.eq_ignore_ascii_case("AS") && Aesthetic::from_name(word).is_none() {
                return ParseError::at_offset(
                    format!("Unknown aesthetic '{}'", word),
                    self.source,
                    offset,
                    context,
                );
            }
        }

        let text = self.get_text(node);
        let snippet: String = text.trim().chars().take(30).collect();
        let message = if snippet.is_empty() {
            "Unexpected end of input".to_string()
        } else {
            format!("Syntax error near '{}'", snippet)
        };
        ParseError::at_offset(message, self.source, node.start_byte(), context)
    }
}

/// Preorder search for an ERROR or MISSING node
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// Human name of the clause containing `node`
fn enclosing_clause(node: &Node) -> &'static str {
    let mut current = Some(*node);
    while let Some(n) = current {
        match n.kind() {
            "draw_clause" => return "DRAW clause",
            "mapping_clause" => return "MAPPING clause",
            "setting_clause" => return "SETTING clause",
            "filter_clause" => return "FILTER clause",
            "facet_clause" => return "FACET clause",
            "label_clause" => return "LABEL clause",
            "project_clause" | "coord_clause" => return "PROJECT clause",
            "from_clause" => return "VISUALISE FROM",
            _ => current = n.parent(),
        }
    }
    "VISUALISE statement"
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte offset where the word before `offset` starts
fn previous_word_start(source: &str, offset: usize) -> usize {
    let before = &source[..offset.min(source.len())];
    let trimmed = before.trim_end_matches(|c: char| !is_word_char(c));
    trimmed
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_word_char(*c))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len())
}

/// Words of `text` with their byte offsets
pub(crate) fn words_with_offsets(text: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (is_word_char(c), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                words.push((s, &text[s..i]));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push((s, &text[s..]));
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_visualise_statement() {
        let tree = SourceTree::new("VISUALISE x, y DRAW point").unwrap();
        assert_eq!(tree.visualise_statements().len(), 1);
        assert!(tree.syntax_error().is_none());
    }

    #[test]
    fn test_visualise_source() {
        let tree = SourceTree::new("VISUALISE FROM mtcars DRAW point MAPPING mpg AS x, hp AS y")
            .unwrap();
        assert_eq!(tree.visualise_source().as_deref(), Some("mtcars"));

        let tree = SourceTree::new("VISUALISE FROM 'data/sales.csv' DRAW point").unwrap();
        assert_eq!(tree.visualise_source().as_deref(), Some("'data/sales.csv'"));

        let tree = SourceTree::new("VISUALISE x, y DRAW point").unwrap();
        assert_eq!(tree.visualise_source(), None);
    }

    #[test]
    fn test_unknown_mark_is_named() {
        let tree = SourceTree::new("VISUALISE x, y DRAW invalid_geom").unwrap();
        let err = tree.syntax_error().unwrap();
        assert!(err.message.contains("invalid_geom"));
        assert_eq!(err.line, 0);
    }

    #[test]
    fn test_words_with_offsets() {
        assert_eq!(
            words_with_offsets("DRAW  blob, x"),
            vec![(0, "DRAW"), (6, "blob"), (12, "x")]
        );
        assert_eq!(previous_word_start("DRAW blob", 5), 0);
        assert_eq!(previous_word_start("a AS  bogus", 6), 2);
    }
}
