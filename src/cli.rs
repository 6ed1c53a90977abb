/*!
ggsql Command Line Interface

Splits, parses, validates and executes ggsql queries, writing the rendered
chart to stdout or a file.
*/

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use ggsql_core::reader::Reader;
use ggsql_core::{parser, validate, Plot, Validated, VERSION};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "duckdb")]
use ggsql_core::reader::DuckDBReader;

#[cfg(feature = "vegalite")]
use ggsql_core::writer::{VegaLiteWriter, Writer};

#[derive(Parser)]
#[command(name = "ggsql")]
#[command(about = "SQL extension for declarative data visualization")]
#[command(version = VERSION)]
pub struct Cli {
    /// Log debug output to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the SQL and VISUALISE portions of a query
    Split {
        /// The ggsql query to split
        query: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },

    /// Parse a query and show the AST (for debugging)
    Parse {
        /// The ggsql query to parse
        query: String,

        /// Output format for AST
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },

    /// Validate a query without rendering it
    Validate {
        /// The ggsql query to validate
        query: String,

        /// Data source connection string (needed for column validation)
        #[arg(long)]
        reader: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },

    /// Execute a ggsql query
    Exec {
        /// The ggsql query to execute
        query: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Execute a ggsql query from a file
    Run {
        /// Path to .sql file containing ggsql query
        file: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct OutputArgs {
    /// Data source connection string
    #[arg(long, default_value = "duckdb://memory")]
    pub reader: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = WriterKind::Vegalite)]
    pub writer: WriterKind,

    /// Output file path
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pretty,
    Json,
    Debug,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterKind {
    Vegalite,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "duckdb")]
fn open_reader(uri: &str) -> anyhow::Result<Box<dyn Reader>> {
    let reader = DuckDBReader::from_connection_string(uri)
        .with_context(|| format!("Failed to open reader '{}'", uri))?;
    Ok(Box::new(reader))
}

#[cfg(not(feature = "duckdb"))]
fn open_reader(uri: &str) -> anyhow::Result<Box<dyn Reader>> {
    bail!(
        "No reader support compiled in for '{}'. Rebuild with --features duckdb",
        uri
    )
}

fn split_output(query: &str, format: Format) -> anyhow::Result<String> {
    let split = parser::split_query(query)?;
    Ok(match format {
        Format::Json => serde_json::to_string_pretty(&json!({
            "sql": split.sql,
            "visual": split.visual,
        }))?,
        Format::Debug => format!("{:#?}", split),
        Format::Pretty => format!("SQL:\n{}\n\nVISUALISE:\n{}", split.sql, split.visual),
    })
}

fn describe_plot(plot: &Plot) -> String {
    let mut lines = vec![format!("Layers: {}", plot.layers.len())];
    for (idx, layer) in plot.layers.iter().enumerate() {
        let mut line = format!("  {}. {}", idx + 1, layer.geom);
        if let Some(filter) = &layer.filter {
            line.push_str(&format!(" FILTER {}", filter));
        }
        lines.push(line);
    }
    if let Some(source) = &plot.source {
        lines.push(format!("Source: {}", source));
    }
    if let Some(facet) = &plot.facet {
        lines.push(format!("Facet: {}", facet.columns().join(", ")));
    }
    if let Some(project) = &plot.project {
        lines.push(format!("Project: {}", project.coord));
    }
    if let Some(labels) = &plot.labels {
        for label in &labels.labels {
            lines.push(format!("Label {}: {}", label.key, label.text));
        }
    }
    lines.join("\n")
}

fn parse_output(query: &str, format: Format) -> anyhow::Result<String> {
    let Some(plot) = parser::parse_query(query)? else {
        bail!("Query has no VISUALISE clause");
    };
    Ok(match format {
        Format::Json => serde_json::to_string_pretty(&plot)?,
        Format::Debug => format!("{:#?}", plot),
        Format::Pretty => describe_plot(&plot),
    })
}

/// Validate, checking columns against the SQL result when a reader is given
fn validate_query(query: &str, reader: Option<&str>) -> anyhow::Result<Validated> {
    let Some(uri) = reader else {
        return Ok(validate(query));
    };
    let sql = parser::split_query(query)?.sql;
    if sql.is_empty() {
        return Ok(validate(query));
    }
    let reader = open_reader(uri)?;
    let df = reader.execute_sql(&sql)?;
    let schema: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    debug!(columns = schema.len(), "Validating against query columns");
    Ok(ggsql_core::validate::validate_with_schema(query, &schema))
}

fn validation_output(validated: &Validated, format: Format) -> anyhow::Result<String> {
    Ok(match format {
        Format::Json => serde_json::to_string_pretty(&json!({
            "valid": validated.valid(),
            "has_visual": validated.has_visual(),
            "errors": validated.errors(),
            "warnings": validated.warnings(),
        }))?,
        Format::Debug => format!("{:#?}", validated),
        Format::Pretty => {
            let mut lines = Vec::new();
            let location = |loc: Option<ggsql_core::Location>| {
                loc.map(|l| format!(" (line {}, column {})", l.line + 1, l.column + 1))
                    .unwrap_or_default()
            };
            for error in validated.errors() {
                lines.push(format!("error: {}{}", error.message, location(error.location)));
            }
            for warning in validated.warnings() {
                lines.push(format!("warning: {}{}", warning.message, location(warning.location)));
            }
            if validated.valid() {
                lines.push("Query is valid".to_string());
            }
            lines.join("\n")
        }
    })
}

fn render(query: &str, args: &OutputArgs) -> anyhow::Result<String> {
    let mut reader = open_reader(&args.reader)?;
    let prepared = reader.execute(query, None)?;
    for warning in prepared.warnings() {
        warn!("{}", warning.message);
    }

    match args.writer {
        #[cfg(feature = "vegalite")]
        WriterKind::Vegalite => Ok(VegaLiteWriter::new().render_json(&prepared)?),
        #[cfg(not(feature = "vegalite"))]
        WriterKind::Vegalite => {
            bail!("VegaLite writer not compiled in. Rebuild with --features vegalite")
        }
    }
}

fn read_query_file(file: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read file {}", file.display()))
}

fn emit(text: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write output file {}", path.display()))?;
            debug!(path = %path.display(), "Wrote output");
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Split { query, format } => emit(&split_output(&query, format)?, None),
        Commands::Parse { query, format } => emit(&parse_output(&query, format)?, None),
        Commands::Validate {
            query,
            reader,
            format,
        } => {
            let validated = validate_query(&query, reader.as_deref())?;
            emit(&validation_output(&validated, format)?, None)?;
            if !validated.valid() {
                bail!("Validation failed with {} error(s)", validated.errors().len());
            }
            Ok(())
        }
        Commands::Exec { query, output } => {
            emit(&render(&query, &output)?, output.output.as_deref())
        }
        Commands::Run { file, output } => {
            let query = read_query_file(&file)?;
            emit(&render(&query, &output)?, output.output.as_deref())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_exec_defaults() {
        let cli = Cli::try_parse_from(["ggsql", "exec", "SELECT 1 AS x VISUALISE x DRAW bar"]).unwrap();
        match cli.command {
            Commands::Exec { output, .. } => {
                assert_eq!(output.reader, "duckdb://memory");
                assert_eq!(output.writer, WriterKind::Vegalite);
                assert!(output.output.is_none());
            }
            _ => panic!("expected exec"),
        }
        assert!(!cli.verbose);
    }

    #[test]
    fn test_unknown_writer_is_rejected() {
        let result = Cli::try_parse_from(["ggsql", "exec", "q", "--writer", "plotters"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_split_json() {
        let out = split_output("SELECT 1 AS x VISUALISE x DRAW bar", Format::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["sql"], "SELECT 1 AS x");
        assert_eq!(value["visual"], "VISUALISE x DRAW bar");
    }

    #[test]
    fn test_parse_pretty_lists_layers() {
        let out = parse_output("SELECT 1 VISUALISE x, y DRAW line DRAW point", Format::Pretty).unwrap();
        assert!(out.contains("Layers: 2"));
        assert!(out.contains("1. line"));
        assert!(out.contains("2. point"));
    }

    #[test]
    fn test_parse_without_visualise_fails() {
        assert!(parse_output("SELECT 1", Format::Pretty).is_err());
    }

    #[test]
    fn test_validation_pretty_output() {
        let validated = validate("SELECT 1 AS a VISUALISE a AS x DRAW point");
        let out = validation_output(&validated, Format::Pretty).unwrap();
        assert!(!validated.valid());
        assert!(out.starts_with("error: "));
        assert!(out.contains("requires aesthetic 'y'"));
    }

    #[cfg(feature = "duckdb")]
    #[test]
    fn test_validate_with_reader_checks_columns() {
        let validated = validate_query(
            "SELECT 1 AS a, 2 AS b VISUALISE a AS x, c AS y DRAW point",
            Some("duckdb://memory"),
        )
        .unwrap();
        assert!(!validated.valid());
        assert!(validated.errors()[0].message.contains("column 'c' not found"));
    }

    #[cfg(all(feature = "duckdb", feature = "vegalite"))]
    #[test]
    fn test_run_file_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let query_path = dir.path().join("chart.sql");
        let out_path = dir.path().join("chart.vl.json");
        std::fs::write(
            &query_path,
            "SELECT * FROM (VALUES (1, 2), (3, 4)) AS t(x, y)\nVISUALISE x, y DRAW point\n",
        )
        .unwrap();

        let args = OutputArgs {
            reader: "duckdb://memory".to_string(),
            writer: WriterKind::Vegalite,
            output: Some(out_path.clone()),
        };
        let query = read_query_file(&query_path).unwrap();
        emit(&render(&query, &args).unwrap(), args.output.as_deref()).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out_path).unwrap()).unwrap();
        assert_eq!(written["layer"][0]["mark"]["type"], "point");
    }

    #[test]
    fn test_missing_query_file() {
        let err = read_query_file(Path::new("/nonexistent/query.sql")).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }
}
