//! Plot builder
//!
//! Walks the tree-sitter CST of the VISUALISE text and builds a [`Plot`].
//! Syntax errors are reported from the tree before any walking happens;
//! what remains here are the checks the grammar cannot express (known marks
//! and aesthetics, literal values, duplicate clauses and keys).

use super::error::ParseError;
use super::source_tree::{words_with_offsets, SourceTree};
use super::splitter::find_visualise;
use crate::plot::{
    Aesthetic, CoordKind, Facet, Geom, LabelKey, Labels, Layer, MappingItem, ParameterValue,
    Plot, Projection,
};
use tracing::debug;
use tree_sitter::Node;

/// Clause nodes a VISUALISE statement is made of
const CLAUSE_KINDS: &[&str] = &[
    "draw_clause",
    "facet_clause",
    "label_clause",
    "project_clause",
    "coord_clause",
];

/// Nodes holding a single mapping entry
const MAPPING_KINDS: &[&str] = &[
    "global_mapping_item",
    "wildcard_mapping",
    "explicit_mapping",
    "implicit_mapping",
    "mapping_item",
];

/// Nodes holding a value inside a mapping entry
const VALUE_KINDS: &[&str] = &[
    "mapping_value",
    "column_reference",
    "literal_value",
    "identifier",
    "quoted_identifier",
    "string",
    "number",
    "boolean",
];

/// `key => value` nodes of SETTING and LABEL
const ASSIGNMENT_KINDS: &[&str] = &[
    "parameter_assignment",
    "setting_item",
    "label_assignment",
];

/// Parse VISUALISE text into a Plot
pub fn build_plot(visual: &str) -> Result<Plot, ParseError> {
    let context = "VISUALISE statement";

    // A second top-level keyword starts another statement
    if let Some(second) = visual
        .get(9..)
        .and_then(find_visualise)
        .map(|offset| offset + 9)
    {
        return Err(ParseError::at_offset(
            "Only one VISUALISE statement is allowed per query",
            visual,
            second,
            context,
        ));
    }

    let tree =
        SourceTree::new(visual).map_err(|e| ParseError::new(e.to_string(), 0, 0, context))?;
    if let Some(err) = tree.syntax_error() {
        return Err(err);
    }
    let statements = tree.visualise_statements();
    let Some(statement) = statements.first() else {
        return Err(ParseError::at_offset("Expected VISUALISE", visual, 0, context));
    };

    let builder = PlotBuilder { tree: &tree };
    let plot = builder.visualise_statement(statement)?;
    debug!(
        layers = plot.layers.len(),
        facet = plot.facet.is_some(),
        project = plot.project.is_some(),
        "Built plot"
    );
    Ok(plot)
}

struct PlotBuilder<'t, 'a> {
    tree: &'t SourceTree<'a>,
}

impl PlotBuilder<'_, '_> {
    fn text(&self, node: &Node) -> String {
        self.tree.get_text(node)
    }

    fn error(&self, node: &Node, message: impl Into<String>, context: &str) -> ParseError {
        ParseError::at_offset(message, self.tree.source, node.start_byte(), context)
    }

    fn visualise_statement(&self, statement: &Node) -> Result<Plot, ParseError> {
        let context = "VISUALISE statement";
        let mut plot = Plot::new();
        plot.source = self.tree.visualise_source();

        let mut global = Vec::new();
        for item in find_all(statement, MAPPING_KINDS, CLAUSE_KINDS) {
            if within(&item, "from_clause") {
                continue;
            }
            global.push(self.mapping_item(&item, "VISUALISE mappings")?);
        }
        plot.global_mappings = global;

        let mut labels = Labels::default();
        for clause in find_all(statement, CLAUSE_KINDS, &[]) {
            match clause.kind() {
                "draw_clause" => plot.layers.push(self.layer(&clause)?),
                "facet_clause" => {
                    if plot.facet.is_some() {
                        return Err(self.error(
                            &clause,
                            "Only one FACET clause is allowed",
                            "FACET clause",
                        ));
                    }
                    plot.facet = Some(self.facet(&clause)?);
                }
                "label_clause" => self.label_clause(&clause, &mut labels)?,
                _ => {
                    if plot.project.is_some() {
                        return Err(self.error(
                            &clause,
                            "Only one PROJECT clause is allowed",
                            "PROJECT clause",
                        ));
                    }
                    plot.project = Some(self.project(&clause)?);
                }
            }
        }

        if plot.layers.is_empty() {
            return Err(ParseError::at_offset(
                "VISUALISE requires at least one DRAW clause",
                self.tree.source,
                statement.end_byte(),
                context,
            ));
        }
        if !labels.is_empty() {
            plot.labels = Some(labels);
        }
        Ok(plot)
    }

    /// One entry of a mapping list: `*`, `value AS aesthetic` or a bare column
    fn mapping_item(&self, node: &Node, context: &str) -> Result<MappingItem, ParseError> {
        if node.kind() == "wildcard_mapping" || self.text(node).trim() == "*" {
            return Ok(MappingItem::Wildcard);
        }

        let aesthetic = match find_all(node, &["aesthetic_name"], &[]).first() {
            Some(aes_node) => {
                let name = self.text(aes_node);
                let aesthetic = Aesthetic::from_name(name.trim()).ok_or_else(|| {
                    self.error(aes_node, format!("Unknown aesthetic '{}'", name.trim()), context)
                })?;
                Some(aesthetic)
            }
            None => None,
        };

        let value_node = find_all(node, VALUE_KINDS, &["aesthetic_name"])
            .into_iter()
            .next()
            .unwrap_or(*node);
        let raw = self.text(&value_node);

        if let Some(value) = literal_from_text(&raw) {
            return match aesthetic {
                Some(aesthetic) => Ok(MappingItem::Literal { value, aesthetic }),
                None => Err(self.error(
                    &value_node,
                    format!("Literal {} must be mapped to an aesthetic with AS", value),
                    context,
                )),
            };
        }

        let name = unquote_identifier(&raw);
        if name.is_empty() {
            return Err(self.error(&value_node, "Expected a column name", context));
        }
        let aesthetic = aesthetic.or_else(|| Aesthetic::from_name(&name));
        Ok(MappingItem::Column {
            name,
            aesthetic,
            offset: value_node.start_byte(),
        })
    }

    fn layer(&self, node: &Node) -> Result<Layer, ParseError> {
        let context = "DRAW clause";
        let (mark_offset, mark) = match find_all(node, &["geom_type"], &[]).first() {
            Some(geom_node) => (geom_node.start_byte(), self.text(geom_node)),
            None => {
                let text = self.text(node);
                match words_with_offsets(&text).get(1) {
                    Some((offset, word)) => (node.start_byte() + offset, word.to_string()),
                    None => {
                        return Err(self.error(node, "Expected a mark after DRAW", context));
                    }
                }
            }
        };
        let geom = Geom::from_name(mark.trim()).ok_or_else(|| {
            ParseError::at_offset(
                format!(
                    "Unknown mark '{}'. Expected one of: {}",
                    mark.trim(),
                    Geom::names().join(", ")
                ),
                self.tree.source,
                mark_offset,
                context,
            )
        })?;

        let mut layer = Layer::new(geom);
        layer.offset = node.start_byte();
        let (mut seen_mapping, mut seen_setting) = (false, false);

        for clause in find_all(
            node,
            &["mapping_clause", "setting_clause", "filter_clause"],
            &[],
        ) {
            match clause.kind() {
                "mapping_clause" => {
                    if seen_mapping {
                        return Err(self.error(&clause, "Duplicate MAPPING in DRAW clause", context));
                    }
                    seen_mapping = true;
                    layer.mapping = find_all(&clause, MAPPING_KINDS, &[])
                        .iter()
                        .map(|item| self.mapping_item(item, "MAPPING clause"))
                        .collect::<Result<_, _>>()?;
                    layer.inherits_global = false;
                }
                "setting_clause" => {
                    if seen_setting {
                        return Err(self.error(&clause, "Duplicate SETTING in DRAW clause", context));
                    }
                    seen_setting = true;
                    self.settings(&clause, &mut layer)?;
                }
                _ => {
                    if layer.filter.is_some() {
                        return Err(self.error(&clause, "Duplicate FILTER in DRAW clause", context));
                    }
                    let text = self.text(&clause);
                    let condition = strip_keyword(&text, "FILTER");
                    if condition.is_empty() {
                        return Err(self.error(
                            &clause,
                            "FILTER requires a condition",
                            "FILTER clause",
                        ));
                    }
                    layer.filter = Some(condition.to_string());
                }
            }
        }

        Ok(layer)
    }

    /// (name node, value node) pairs of `key => value` entries
    fn assignments<'n>(&self, clause: &Node<'n>) -> Vec<(Node<'n>, Node<'n>)> {
        find_all(clause, ASSIGNMENT_KINDS, &[])
            .into_iter()
            .filter_map(|assignment| {
                let mut cursor = assignment.walk();
                let named: Vec<Node> = assignment.named_children(&mut cursor).collect();
                match (named.first(), named.last()) {
                    (Some(key), Some(value)) if named.len() >= 2 => Some((*key, *value)),
                    _ => None,
                }
            })
            .collect()
    }

    fn settings(&self, clause: &Node, layer: &mut Layer) -> Result<(), ParseError> {
        let context = "SETTING clause";
        for (key, value_node) in self.assignments(clause) {
            let name = self.text(&key).trim().to_ascii_lowercase();
            let raw = self.text(&value_node);
            let Some(value) = literal_from_text(&raw) else {
                return Err(self.error(
                    &value_node,
                    format!(
                        "Expected a literal value for '{}', found '{}'",
                        name,
                        raw.trim()
                    ),
                    context,
                ));
            };
            if layer.parameters.insert(name.clone(), value).is_some() {
                return Err(self.error(&key, format!("Duplicate setting '{}'", name), context));
            }
        }
        Ok(())
    }

    fn facet(&self, node: &Node) -> Result<Facet, ParseError> {
        let context = "FACET clause";
        let text = self.text(node);
        let words: Vec<&str> = words_with_offsets(&text)
            .into_iter()
            .skip(1)
            .map(|(_, w)| w)
            .collect();
        let is = |w: &str, kw: &str| w.eq_ignore_ascii_case(kw);

        let facet = match words.as_slice() {
            [wrap, column] if is(wrap, "WRAP") => Facet::Wrap {
                column: column.to_string(),
            },
            [grid, row] if is(grid, "GRID") => Facet::Grid {
                row: row.to_string(),
                column: None,
            },
            [grid, row, by, column] if is(grid, "GRID") && is(by, "BY") => Facet::Grid {
                row: row.to_string(),
                column: Some(column.to_string()),
            },
            [row, by, column] if is(by, "BY") => Facet::Grid {
                row: row.to_string(),
                column: Some(column.to_string()),
            },
            [column] => Facet::Wrap {
                column: column.to_string(),
            },
            _ => {
                return Err(self.error(
                    node,
                    "Expected FACET [WRAP] column or FACET [GRID] row BY column",
                    context,
                ))
            }
        };
        Ok(facet)
    }

    fn label_clause(&self, clause: &Node, labels: &mut Labels) -> Result<(), ParseError> {
        let context = "LABEL clause";
        for (key_node, value_node) in self.assignments(clause) {
            let name = self.text(&key_node);
            let key = LabelKey::from_name(name.trim()).ok_or_else(|| {
                self.error(&key_node, format!("Unknown label '{}'", name.trim()), context)
            })?;
            let raw = self.text(&value_node);
            let Some(ParameterValue::String(text)) = literal_from_text(&raw) else {
                return Err(self.error(
                    &value_node,
                    format!("Label '{}' must be a string, found '{}'", key, raw.trim()),
                    context,
                ));
            };
            if !labels.insert(key, text) {
                return Err(self.error(
                    &key_node,
                    format!("Duplicate label '{}'", key),
                    context,
                ));
            }
        }
        Ok(())
    }

    fn project(&self, node: &Node) -> Result<Projection, ParseError> {
        let context = "PROJECT clause";
        let text = self.text(node);
        let coord = words_with_offsets(&text)
            .into_iter()
            .skip(1)
            .find(|(_, w)| !w.eq_ignore_ascii_case("TO"));
        let Some((offset, name)) = coord else {
            return Err(self.error(node, "PROJECT requires a coordinate system", context));
        };
        let coord = CoordKind::from_name(name).ok_or_else(|| {
            ParseError::at_offset(
                format!(
                    "Unknown projection '{}'. Expected one of: {}",
                    name,
                    CoordKind::names().join(", ")
                ),
                self.tree.source,
                node.start_byte() + offset,
                context,
            )
        })?;
        Ok(Projection { coord })
    }
}

/// Descendants of `node` whose kind is in `kinds`, in source order. Matches
/// are not searched further, and subtrees rooted at a `skip` kind are ignored.
fn find_all<'n>(node: &Node<'n>, kinds: &[&str], skip: &[&str]) -> Vec<Node<'n>> {
    let mut found = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if kinds.contains(&child.kind()) {
            found.push(child);
        } else if !skip.contains(&child.kind()) {
            found.extend(find_all(&child, kinds, skip));
        }
    }
    found
}

/// True if an ancestor of `node` has kind `kind`
fn within(node: &Node, kind: &str) -> bool {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == kind {
            return true;
        }
        current = n.parent();
    }
    false
}

/// `text` with a leading keyword removed, case-insensitively
fn strip_keyword<'s>(text: &'s str, keyword: &str) -> &'s str {
    let trimmed = text.trim();
    match trimmed.get(..keyword.len()) {
        Some(head) if head.eq_ignore_ascii_case(keyword) => trimmed[keyword.len()..].trim(),
        _ => trimmed,
    }
}

/// String, number (optionally negative) or boolean literal
fn literal_from_text(text: &str) -> Option<ParameterValue> {
    let t = text.trim();
    if t.len() >= 2 && t.starts_with('\'') && t.ends_with('\'') {
        return Some(ParameterValue::String(
            t[1..t.len() - 1].replace("''", "'"),
        ));
    }
    if t.eq_ignore_ascii_case("true") {
        return Some(ParameterValue::Boolean(true));
    }
    if t.eq_ignore_ascii_case("false") {
        return Some(ParameterValue::Boolean(false));
    }
    if t.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.')) {
        return t
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(ParameterValue::Number);
    }
    None
}

/// Column name as written, with double quotes removed
fn unquote_identifier(text: &str) -> String {
    let t = text.trim();
    if t.len() >= 2 && t.starts_with('"') && t.ends_with('"') {
        t[1..t.len() - 1].replace("\"\"", "\"")
    } else {
        t.to_string()
    }
}
