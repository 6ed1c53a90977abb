//! Semantic validation
//!
//! Resolves each layer's aesthetic mappings and checks them against the mark
//! and, when known, the column schema of the base query result.
//!
//! Mapping precedence inside a layer, highest first:
//!
//! 1. the layer's own MAPPING entries
//! 2. wildcard (`*`) expansion against the schema
//! 3. entries inherited from the top-level VISUALISE list, only for DRAW
//!    clauses that have no MAPPING of their own
//!
//! Validation never stops at the first problem: every error and warning
//! across all layers is collected so callers see the full list at once.

use crate::naming::is_synthetic_column;
use crate::parser::{self, error::line_column};
use crate::plot::{
    Aesthetic, AestheticValue, GeomAesthetics, Layer, MappingItem, MappingSource, Mappings, Plot,
};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

// ============================================================================
// Result Types
// ============================================================================

/// Result of `validate()`: query inspection without executing the SQL
#[derive(Debug, Clone)]
pub struct Validated {
    sql: String,
    visual: String,
    plot: Option<Plot>,
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationWarning>,
}

impl Validated {
    /// Whether a VISUALISE clause was parsed (independent of validity)
    pub fn has_visual(&self) -> bool {
        self.plot.is_some()
    }

    /// The SQL portion, after any VISUALISE FROM injection
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The VISUALISE portion (raw text)
    pub fn visual(&self) -> &str {
        &self.visual
    }

    /// Parsed and resolved plot, if the visual text parsed
    pub fn plot(&self) -> Option<&Plot> {
        self.plot.as_ref()
    }

    pub fn into_plot(self) -> Option<Plot> {
        self.plot
    }

    /// Whether the query is valid (no errors)
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }
}

/// A validation error (fatal)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub message: String,
    pub location: Option<Location>,
}

/// A validation warning (non-fatal)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationWarning {
    pub message: String,
    pub location: Option<Location>,
}

/// Location within the VISUALISE text (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

/// Errors and warnings found while resolving a plot
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

// ============================================================================
// Entry Points
// ============================================================================

/// Validate query syntax and semantics without executing SQL
///
/// Column existence is not checked and layers relying on `*` skip the
/// required-aesthetic check, since both need the result schema.
pub fn validate(query: &str) -> Validated {
    validate_query(query, None)
}

/// Validate a query against the column names its SQL produces
pub fn validate_with_schema(query: &str, schema: &[String]) -> Validated {
    validate_query(query, Some(schema))
}

fn validate_query(query: &str, schema: Option<&[String]>) -> Validated {
    let split = match parser::split_query(query) {
        Ok(split) => split,
        Err(e) => {
            return Validated {
                sql: String::new(),
                visual: String::new(),
                plot: None,
                errors: vec![ValidationError {
                    message: e.to_string(),
                    location: None,
                }],
                warnings: Vec::new(),
            }
        }
    };

    if !split.has_visual() {
        return Validated {
            sql: split.sql,
            visual: split.visual,
            plot: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        };
    }

    let mut plot = match parser::builder::build_plot(&split.visual) {
        Ok(plot) => plot,
        Err(e) => {
            return Validated {
                sql: split.sql,
                visual: split.visual,
                plot: None,
                errors: vec![ValidationError {
                    message: e.message,
                    location: Some(Location {
                        line: e.line,
                        column: e.column,
                    }),
                }],
                warnings: Vec::new(),
            }
        }
    };

    let mut diagnostics = resolve_plot(&mut plot, schema, &split.visual);
    if split.sql.is_empty() {
        diagnostics.errors.insert(
            0,
            ValidationError {
                message: "Query has no SQL to visualise. Add a SELECT before VISUALISE or use \
                          VISUALISE FROM <table>"
                    .to_string(),
                location: None,
            },
        );
    }

    debug!(
        errors = diagnostics.errors.len(),
        warnings = diagnostics.warnings.len(),
        "Validated query"
    );
    Validated {
        sql: split.sql,
        visual: split.visual,
        plot: Some(plot),
        errors: diagnostics.errors,
        warnings: diagnostics.warnings,
    }
}

/// Validate an already parsed plot
///
/// Returns the plot with resolved aesthetics and stats. Errors carry no
/// location since the source text is unknown here.
pub fn validate_plot(
    mut plot: Plot,
    schema: Option<&[String]>,
) -> (Plot, Vec<ValidationError>, Vec<ValidationWarning>) {
    let diagnostics = run_resolver(&mut plot, schema, None);
    (plot, diagnostics.errors, diagnostics.warnings)
}

/// Resolve every layer's mappings in place and collect diagnostics
///
/// Fills [`Layer::aesthetics`] and [`Layer::stat`]. `visual` is the text the
/// plot was parsed from and is only used to compute locations.
pub fn resolve_plot(plot: &mut Plot, schema: Option<&[String]>, visual: &str) -> Diagnostics {
    run_resolver(plot, schema, Some(visual))
}

fn run_resolver(plot: &mut Plot, schema: Option<&[String]>, visual: Option<&str>) -> Diagnostics {
    let mut resolver = Resolver {
        schema,
        visual,
        diagnostics: Diagnostics::default(),
    };
    resolver.resolve(plot);
    resolver.diagnostics
}

// ============================================================================
// Resolver
// ============================================================================

struct Resolver<'a> {
    schema: Option<&'a [String]>,
    visual: Option<&'a str>,
    diagnostics: Diagnostics,
}

impl<'a> Resolver<'a> {
    fn location(&self, offset: usize) -> Option<Location> {
        let (line, column) = line_column(self.visual?, offset);
        Some(Location { line, column })
    }

    fn error(&mut self, message: String, location: Option<Location>) {
        self.diagnostics
            .errors
            .push(ValidationError { message, location });
    }

    fn warn(&mut self, message: String, location: Option<Location>) {
        self.diagnostics
            .warnings
            .push(ValidationWarning { message, location });
    }

    fn has_column(&self, name: &str) -> bool {
        self.schema
            .map(|cols| cols.iter().any(|c| c == name))
            .unwrap_or(true)
    }

    fn available_columns(&self) -> String {
        self.schema.map(|cols| cols.join(", ")).unwrap_or_default()
    }

    fn resolve(&mut self, plot: &mut Plot) {
        if let Some(schema) = self.schema {
            for column in schema.iter().filter(|c| is_synthetic_column(c)) {
                self.error(
                    format!(
                        "Column '{}' uses a name reserved for ggsql's own columns; rename it in the query",
                        column
                    ),
                    None,
                );
            }
        }
        self.check_list(&plot.global_mappings, "VISUALISE");

        let mut used_global = vec![false; plot.global_mappings.len()];
        let global_wildcard = plot.has_global_wildcard();
        for (idx, layer) in plot.layers.iter_mut().enumerate() {
            self.resolve_layer(
                idx,
                layer,
                &plot.global_mappings,
                global_wildcard,
                &mut used_global,
            );
        }

        if let Some(facet) = &plot.facet {
            for column in facet.columns() {
                if !self.has_column(column) {
                    let message = format!(
                        "FACET column '{}' not found in query result. Available columns: {}",
                        column,
                        self.available_columns()
                    );
                    self.error(message, None);
                }
            }
        }

        for (item, used) in plot.global_mappings.iter().zip(used_global) {
            if used {
                continue;
            }
            if let MappingItem::Column {
                name,
                aesthetic: Some(_),
                offset,
            } = item
            {
                if self.schema.is_some() && !self.has_column(name) {
                    let message = format!(
                        "VISUALISE: column '{}' not found in query result. Available columns: {}",
                        name,
                        self.available_columns()
                    );
                    let location = self.location(*offset);
                    self.error(message, location);
                }
            }
            let (description, location) = match item {
                MappingItem::Column {
                    name,
                    aesthetic: Some(aes),
                    offset,
                } => (format!("'{}' AS {}", name, aes), self.location(*offset)),
                MappingItem::Literal { value, aesthetic } => {
                    (format!("{} AS {}", value, aesthetic), None)
                }
                _ => continue,
            };
            self.warn(
                format!("Top-level mapping {} is not used by any layer", description),
                location,
            );
        }
    }

    /// Errors local to one mapping list: bare names that are not aesthetics
    /// and aesthetics mapped twice.
    fn check_list(&mut self, items: &[MappingItem], owner: &str) {
        let mut seen: HashSet<Aesthetic> = HashSet::new();
        for item in items {
            let location = match item {
                MappingItem::Column { offset, .. } => self.location(*offset),
                _ => None,
            };
            match item {
                MappingItem::Wildcard => {}
                MappingItem::Column {
                    name,
                    aesthetic: None,
                    ..
                } => self.error(
                    format!(
                        "{}: column '{}' is not an aesthetic name; map it with '{} AS <aesthetic>'",
                        owner, name, name
                    ),
                    location,
                ),
                _ => {
                    if let Some(aes) = item.aesthetic() {
                        if !seen.insert(aes) {
                            self.error(
                                format!("{}: aesthetic '{}' is mapped more than once", owner, aes),
                                location,
                            );
                        }
                    }
                }
            }
        }
    }

    fn resolve_layer(
        &mut self,
        idx: usize,
        layer: &mut Layer,
        global: &[MappingItem],
        global_wildcard: bool,
        used_global: &mut [bool],
    ) {
        let owner = format!("Layer {}", idx + 1);
        let mark = layer.geom.to_string();
        let supported = layer.geom.aesthetics();
        let mut resolved = Mappings::new();

        // 1. The layer's own MAPPING
        self.check_list(&layer.mapping, &owner);
        let mut explicit_columns: HashSet<&str> = HashSet::new();
        for item in &layer.mapping {
            let Some(aes) = item.aesthetic() else {
                continue;
            };
            if !supported.is_supported(aes) {
                let location = match item {
                    MappingItem::Column { offset, .. } => self.location(*offset),
                    _ => self.location(layer.offset),
                };
                self.error(
                    format!(
                        "{}: aesthetic '{}' is not supported by mark '{}'",
                        owner, aes, mark
                    ),
                    location,
                );
                continue;
            }
            if resolved.contains(aes) {
                continue;
            }
            if let MappingItem::Column { name, .. } = item {
                explicit_columns.insert(name.as_str());
            }
            resolved.insert(aes, item_value(item), MappingSource::Explicit);
        }

        // 2. Wildcard expansion
        let has_wildcard = (layer.inherits_global && global_wildcard)
            || layer.mapping.iter().any(|m| m.is_wildcard());
        if has_wildcard {
            if let Some(schema) = self.schema {
                for column in schema {
                    let Some(aes) = Aesthetic::from_name(column) else {
                        continue;
                    };
                    if supported.is_supported(aes)
                        && !resolved.contains(aes)
                        && !explicit_columns.contains(column.as_str())
                    {
                        resolved.insert(
                            aes,
                            AestheticValue::standard_column(column.clone()),
                            MappingSource::Wildcard,
                        );
                    }
                }
            }
        }

        // 3. Inherited top-level mappings, only for DRAW clauses without MAPPING
        let inherited = if layer.inherits_global { global } else { &[] };
        for (gidx, item) in inherited.iter().enumerate() {
            let Some(aes) = item.aesthetic() else {
                continue;
            };
            if !supported.is_supported(aes) {
                continue;
            }
            let value = item_value(item);
            match resolved.source(aes) {
                None => {
                    resolved.insert(aes, value, MappingSource::Inherited);
                    used_global[gidx] = true;
                }
                Some(MappingSource::Wildcard) if resolved.get(aes) != Some(&value) => {
                    let location = match item {
                        MappingItem::Column { offset, .. } => self.location(*offset),
                        _ => None,
                    };
                    let wildcard_column = resolved.get(aes).map(|v| v.to_string());
                    self.warn(
                        format!(
                            "{}: wildcard column '{}' takes precedence over top-level mapping {} AS {}",
                            owner,
                            wildcard_column.unwrap_or_default(),
                            value,
                            aes
                        ),
                        location,
                    );
                }
                Some(_) => {}
            }
        }

        // 4. Stat
        layer.stat = layer.geom.stat(&resolved, &layer.parameters);

        // 5. Required aesthetics
        if !(has_wildcard && self.schema.is_none()) {
            self.check_required(&owner, &mark, &supported, &resolved, layer.offset);
        }

        // 6. SETTING
        self.check_settings(&owner, &mark, layer);

        // 7. Column existence
        if self.schema.is_some() {
            for column in resolved.columns() {
                if !self.has_column(column) {
                    let location = column_offset(&layer.mapping, column)
                        .or_else(|| column_offset(global, column))
                        .and_then(|offset| self.location(offset));
                    let message = format!(
                        "{}: column '{}' not found in query result. Available columns: {}",
                        owner,
                        column,
                        self.available_columns()
                    );
                    self.error(message, location);
                }
            }
        }

        layer.aesthetics = resolved;
    }

    fn check_required(
        &mut self,
        owner: &str,
        mark: &str,
        supported: &GeomAesthetics,
        resolved: &Mappings,
        offset: usize,
    ) {
        for aes in supported.required {
            if !resolved.contains(*aes) {
                let location = self.location(offset);
                self.error(
                    format!(
                        "{}: mark '{}' requires aesthetic '{}', which is not mapped",
                        owner, mark, aes
                    ),
                    location,
                );
            }
        }
    }

    fn check_settings(&mut self, owner: &str, mark: &str, layer: &Layer) {
        let supported = layer.geom.aesthetics();
        for (key, value) in &layer.parameters {
            if let Some(aes) = Aesthetic::from_name(key) {
                if !supported.is_supported(aes) {
                    let location = self.location(layer.offset);
                    self.error(
                        format!(
                            "{}: aesthetic '{}' is not supported by mark '{}'",
                            owner, aes, mark
                        ),
                        location,
                    );
                }
                continue;
            }
            match layer.geom.default_params().iter().find(|p| p.name == key) {
                Some(param) if !param.kind.accepts(value) => {
                    let location = self.location(layer.offset);
                    self.error(
                        format!(
                            "{}: setting '{}' must be {}, got {}",
                            owner,
                            key,
                            param.kind.describe(),
                            value
                        ),
                        location,
                    );
                }
                Some(_) => {}
                None => {
                    let location = self.location(layer.offset);
                    self.error(
                        format!("{}: unknown setting '{}' for mark '{}'", owner, key, mark),
                        location,
                    );
                }
            }
        }
    }
}

fn item_value(item: &MappingItem) -> AestheticValue {
    match item {
        MappingItem::Column { name, .. } => AestheticValue::standard_column(name.clone()),
        MappingItem::Literal { value, .. } => AestheticValue::Literal(value.clone()),
        MappingItem::Wildcard => AestheticValue::standard_column("*"),
    }
}

fn column_offset(items: &[MappingItem], column: &str) -> Option<usize> {
    items.iter().find_map(|item| match item {
        MappingItem::Column { name, offset, .. } if name == column => Some(*offset),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::Stat;

    fn schema(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    fn messages(validated: &Validated) -> Vec<String> {
        validated
            .errors()
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    #[test]
    fn test_validate_with_visual() {
        let validated =
            validate("SELECT 1 as x, 2 as y VISUALISE DRAW point MAPPING x AS x, y AS y");
        assert!(validated.has_visual());
        assert_eq!(validated.sql(), "SELECT 1 as x, 2 as y");
        assert!(validated.visual().starts_with("VISUALISE"));
        assert!(validated.valid(), "{:?}", validated.errors());
    }

    #[test]
    fn test_validate_without_visual() {
        let validated = validate("SELECT 1 as x, 2 as y");
        assert!(!validated.has_visual());
        assert!(validated.valid());
        assert_eq!(validated.sql(), "SELECT 1 as x, 2 as y");
        assert_eq!(validated.visual(), "");
    }

    #[test]
    fn test_validate_invalid_mark() {
        let validated = validate("SELECT 1 VISUALISE DRAW invalid_geom");
        assert!(!validated.valid());
        assert!(!validated.has_visual());
        let err = &validated.errors()[0];
        assert!(err.message.contains("invalid_geom"));
        assert_eq!(
            err.location,
            Some(Location {
                line: 0,
                column: 15
            })
        );
    }

    #[test]
    fn test_validate_split_error() {
        let validated = validate("SELECT 1 VISUALISE FROM t DRAW point");
        assert!(!validated.valid());
        assert!(validated.errors()[0].message.contains("semicolon"));
    }

    #[test]
    fn test_missing_required_aesthetic() {
        let validated = validate_with_schema(
            "SELECT 1 AS x, 2 AS y VISUALISE DRAW point MAPPING x AS x",
            &schema(&["x", "y"]),
        );
        assert!(!validated.valid());
        let msgs = messages(&validated);
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("'y'"));
        assert!(msgs[0].contains("point"));
    }

    #[test]
    fn test_one_error_per_missing_aesthetic() {
        let validated = validate("SELECT 1 AS a VISUALISE DRAW segment MAPPING a AS x");
        let msgs = messages(&validated);
        assert_eq!(msgs.len(), 3);
        assert!(msgs[0].contains("'y'"));
        assert!(msgs[1].contains("'xend'"));
        assert!(msgs[2].contains("'yend'"));
    }

    #[test]
    fn test_errors_collected_across_layers() {
        let validated = validate_with_schema(
            "SELECT 1 AS a VISUALISE DRAW point MAPPING a AS x DRAW line MAPPING b AS y",
            &schema(&["a"]),
        );
        let msgs = messages(&validated);
        assert_eq!(msgs.len(), 3, "{:?}", msgs);
        assert!(msgs[0].starts_with("Layer 1") && msgs[0].contains("'y'"));
        assert!(msgs[1].starts_with("Layer 2") && msgs[1].contains("'x'"));
        assert!(msgs[2].starts_with("Layer 2") && msgs[2].contains("column 'b'"));
    }

    #[test]
    fn test_unknown_column() {
        let validated = validate_with_schema(
            "SELECT 1 AS x VISUALISE x, y DRAW point",
            &schema(&["x"]),
        );
        let msgs = messages(&validated);
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("column 'y' not found"));
        assert_eq!(
            validated.errors()[0].location,
            Some(Location { line: 0, column: 13 })
        );
    }

    #[test]
    fn test_unknown_facet_column() {
        let validated = validate_with_schema(
            "SELECT 1 AS x, 2 AS y VISUALISE x, y DRAW point FACET WRAP region",
            &schema(&["x", "y"]),
        );
        assert!(messages(&validated)[0].contains("FACET column 'region'"));
    }

    #[test]
    fn test_bare_name_must_be_an_aesthetic() {
        let validated = validate("SELECT 1 AS x VISUALISE x, region DRAW point");
        let msgs = messages(&validated);
        assert!(msgs.iter().any(|m| m.contains("'region' is not an aesthetic")));
    }

    #[test]
    fn test_duplicate_aesthetic() {
        let validated = validate("SELECT 1 VISUALISE DRAW point MAPPING a AS x, b AS x, c AS y");
        assert!(messages(&validated)
            .iter()
            .any(|m| m.contains("'x' is mapped more than once")));
    }

    #[test]
    fn test_unsupported_aesthetic() {
        let validated =
            validate("SELECT 1 VISUALISE DRAW point MAPPING a AS x, b AS y, c AS label");
        let msgs = messages(&validated);
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("'label' is not supported by mark 'point'"));
    }

    #[test]
    fn test_inherited_mappings_skip_unsupported() {
        let validated = validate(
            "SELECT 1 VISUALISE a AS x, b AS y, c AS label DRAW point DRAW text",
        );
        assert!(validated.valid(), "{:?}", validated.errors());
        let plot = validated.plot().unwrap();
        assert!(!plot.layers[0].aesthetics.contains(Aesthetic::Label));
        assert_eq!(plot.layers[1].aesthetics.column(Aesthetic::Label), Some("c"));
    }

    #[test]
    fn test_layer_mapping_replaces_global() {
        let validated = validate_with_schema(
            "SELECT 1 AS a, 2 AS b, 3 AS c VISUALISE a AS x, b AS y DRAW point MAPPING c AS y",
            &schema(&["a", "b", "c"]),
        );
        assert!(!validated.valid());
        let msgs = messages(&validated);
        assert_eq!(msgs.len(), 1, "{:?}", msgs);
        assert!(msgs[0].contains("requires aesthetic 'x'"));
        let layer = &validated.plot().unwrap().layers[0];
        assert_eq!(layer.aesthetics.column(Aesthetic::X), None);
        assert_eq!(layer.aesthetics.column(Aesthetic::Y), Some("c"));
        assert_eq!(layer.aesthetics.source(Aesthetic::Y), Some(MappingSource::Explicit));
    }

    #[test]
    fn test_only_layers_without_mapping_inherit() {
        let validated = validate(
            "SELECT 1 VISUALISE a AS x, b AS y DRAW point DRAW line MAPPING c AS x, d AS y",
        );
        assert!(validated.valid(), "{:?}", validated.errors());
        let plot = validated.plot().unwrap();
        assert_eq!(
            plot.layers[0].aesthetics.source(Aesthetic::X),
            Some(MappingSource::Inherited)
        );
        assert_eq!(plot.layers[1].aesthetics.column(Aesthetic::X), Some("c"));
        let second = &plot.layers[1].aesthetics;
        assert!(second
            .iter()
            .all(|(aes, _)| second.source(aes) == Some(MappingSource::Explicit)));
    }

    #[test]
    fn test_global_wildcard_not_applied_to_layer_with_mapping() {
        let validated = validate_with_schema(
            "SELECT * FROM t VISUALISE * DRAW point MAPPING a AS x",
            &schema(&["x", "y", "a"]),
        );
        let msgs = messages(&validated);
        assert_eq!(msgs.len(), 1, "{:?}", msgs);
        assert!(msgs[0].contains("requires aesthetic 'y'"));
    }

    #[test]
    fn test_unused_global_column_is_checked() {
        let validated = validate_with_schema(
            "SELECT 1 AS x, 2 AS y VISUALISE x, y, zzz AS label DRAW point",
            &schema(&["x", "y"]),
        );
        assert!(!validated.valid());
        let msgs = messages(&validated);
        assert_eq!(msgs.len(), 1, "{:?}", msgs);
        assert!(msgs[0].contains("column 'zzz' not found"));
        assert_eq!(
            validated.errors()[0].location,
            Some(Location { line: 0, column: 16 })
        );
    }

    #[test]
    fn test_reserved_column_names_are_rejected() {
        let validated = validate_with_schema(
            "SELECT 1 AS x, 2 AS y, 3 AS __ggsql_source__ VISUALISE x, y DRAW point",
            &schema(&["x", "y", "__ggsql_source__"]),
        );
        let msgs = messages(&validated);
        assert_eq!(msgs.len(), 1, "{:?}", msgs);
        assert!(msgs[0].contains("'__ggsql_source__'"));
    }

    #[test]
    fn test_wildcard_expansion() {
        let validated = validate_with_schema(
            "SELECT * FROM t VISUALISE * DRAW point",
            &schema(&["x", "y", "fill", "other"]),
        );
        assert!(validated.valid(), "{:?}", validated.errors());
        let layer = &validated.plot().unwrap().layers[0];
        assert_eq!(layer.aesthetics.len(), 3);
        assert_eq!(
            layer.aesthetics.source(Aesthetic::Fill),
            Some(MappingSource::Wildcard)
        );
    }

    #[test]
    fn test_wildcard_skips_explicitly_mapped_columns() {
        let validated = validate_with_schema(
            "SELECT * FROM t VISUALISE DRAW point MAPPING *, y AS x, x AS y",
            &schema(&["x", "y"]),
        );
        let layer = &validated.plot().unwrap().layers[0];
        assert_eq!(layer.aesthetics.column(Aesthetic::X), Some("y"));
        assert_eq!(layer.aesthetics.column(Aesthetic::Y), Some("x"));
    }

    #[test]
    fn test_wildcard_without_schema_skips_required_check() {
        let validated = validate("SELECT * FROM t VISUALISE * DRAW point");
        assert!(validated.valid());
    }

    #[test]
    fn test_wildcard_beats_inherited_with_warning() {
        let validated = validate_with_schema(
            "SELECT * FROM t VISUALISE *, a AS x DRAW point",
            &schema(&["x", "y", "a"]),
        );
        assert!(validated.valid(), "{:?}", validated.errors());
        let layer = &validated.plot().unwrap().layers[0];
        assert_eq!(layer.aesthetics.column(Aesthetic::X), Some("x"));
        assert!(validated
            .warnings()
            .iter()
            .any(|w| w.message.contains("wildcard column 'x' takes precedence")));
    }

    #[test]
    fn test_unused_global_mapping_warns() {
        let validated = validate("SELECT 1 VISUALISE a AS label DRAW point MAPPING b AS x, c AS y");
        assert!(validated.valid());
        assert_eq!(validated.warnings().len(), 1);
        assert!(validated.warnings()[0].message.contains("'a' AS label"));
    }

    #[test]
    fn test_invalid_settings() {
        let validated = validate(
            "SELECT 1 VISUALISE a AS x DRAW histogram SETTING bins => 0, shape => 'circle', wobble => 1",
        );
        let msgs = messages(&validated);
        assert_eq!(msgs.len(), 3, "{:?}", msgs);
        assert!(msgs.iter().any(|m| m.contains("'bins' must be a positive whole number")));
        assert!(msgs.iter().any(|m| m.contains("'shape' is not supported")));
        assert!(msgs.iter().any(|m| m.contains("unknown setting 'wobble'")));
    }

    #[test]
    fn test_literal_settings_are_accepted() {
        let validated = validate(
            "SELECT 1 VISUALISE a AS x, b AS y DRAW point SETTING color => 'red', size => 4",
        );
        assert!(validated.valid(), "{:?}", validated.errors());
    }

    #[test]
    fn test_stats_are_assigned() {
        let validated =
            validate("SELECT 1 VISUALISE id AS x, name AS color DRAW bar DRAW histogram");
        assert!(validated.valid(), "{:?}", validated.errors());
        let plot = validated.plot().unwrap();
        assert_eq!(plot.layers[0].stat, Some(Stat::Count));
        assert_eq!(
            plot.layers[1].stat,
            Some(Stat::Bin {
                bins: Stat::DEFAULT_BINS
            })
        );
    }

    #[test]
    fn test_bar_with_y_has_no_stat() {
        let validated = validate("SELECT 1 VISUALISE a AS x, b AS y DRAW bar");
        assert_eq!(validated.plot().unwrap().layers[0].stat, None);
    }

    #[test]
    fn test_validate_parsed_plot() {
        let plot = parser::parse_visual("VISUALISE a AS x DRAW point").unwrap();
        let (plot, errors, warnings) = validate_plot(plot, Some(schema(&["a", "b"]).as_slice()));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("'y'"));
        assert_eq!(errors[0].location, None);
        assert!(warnings.is_empty());
        assert_eq!(plot.layers[0].aesthetics.column(Aesthetic::X), Some("a"));
    }

    #[test]
    fn test_visualise_from_has_sql() {
        let validated = validate("VISUALISE FROM t DRAW point MAPPING a AS x, b AS y");
        assert!(validated.valid());
        assert_eq!(validated.sql(), "SELECT * FROM t");
    }

    #[test]
    fn test_missing_sql() {
        let validated = validate("VISUALISE a AS x, b AS y DRAW point");
        assert!(!validated.valid());
        assert!(validated.has_visual());
        assert!(validated.errors()[0].message.contains("no SQL"));
    }
}
