/*!
ggsql Parser Module

Handles splitting ggsql queries into SQL and visualization portions, then
parsing the visualization specification into a typed [`Plot`].

## Architecture

1. **Query Splitting** ([`splitter`]): a quote-, comment- and
   parenthesis-aware scan finds the first top-level `VISUALISE` keyword and
   performs the `VISUALISE FROM` injection.

2. **Tree-sitter Parsing** ([`source_tree`]): the visual text is parsed with
   the tree-sitter-ggsql grammar. The first ERROR or MISSING node becomes a
   [`ParseError`] with a line and column.

3. **Plot Building** ([`builder`]): a walker over the CST builds the
   AST. Semantic checks against the data happen in [`crate::validate`].

## Example Usage

```rust
# use ggsql_core::parser::parse_query;
# use ggsql_core::plot::GeomType;
# fn main() -> Result<(), Box<dyn std::error::Error>> {
let query = r#"
    SELECT date, revenue, region FROM sales WHERE year = 2024
    VISUALISE date AS x, revenue AS y, region AS color
    DRAW line
    LABEL title => 'Sales by Region'
"#;

let plot = parse_query(query)?.expect("query has a VISUALISE clause");
assert_eq!(plot.layers.len(), 1);
assert_eq!(plot.layers[0].geom.geom_type(), GeomType::Line);
# Ok(())
# }
```
*/

use crate::plot::Plot;
use crate::Result;
use tracing::debug;

pub mod builder;
pub mod error;
pub mod source_tree;
pub mod splitter;

pub use error::ParseError;
pub use source_tree::SourceTree;
pub use splitter::{split_query, split_statements, SplitResult};

/// Parse VISUALISE text (as produced by [`split_query`]) into a Plot
pub fn parse_visual(visual: &str) -> Result<Plot> {
    Ok(builder::build_plot(visual)?)
}

/// Split a full ggsql query and parse its visualization part
///
/// Returns `Ok(None)` when the query has no VISUALISE clause.
pub fn parse_query(query: &str) -> Result<Option<Plot>> {
    let split = split_query(query)?;
    if !split.has_visual() {
        return Ok(None);
    }
    debug!(sql = %split.sql, "Parsing visual portion");
    parse_visual(&split.visual).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GgsqlError;

    #[test]
    fn test_parse_query_without_visual() {
        assert!(parse_query("SELECT 1").unwrap().is_none());
    }

    #[test]
    fn test_parse_query_with_visual() {
        let plot = parse_query("SELECT 1 AS x, 2 AS y VISUALISE x, y DRAW point")
            .unwrap()
            .unwrap();
        assert_eq!(plot.layer_count(), 1);
    }

    #[test]
    fn test_grammar_errors_become_parse_errors() {
        let err = parse_query("SELECT 1 AS x VISUALISE x DRAW invalid_geom").unwrap_err();
        assert!(matches!(err, GgsqlError::ParseError(_)));
        assert!(err.to_string().contains("invalid_geom"));
    }
}
