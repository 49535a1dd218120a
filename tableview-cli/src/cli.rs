use std::path::PathBuf;

use clap::Parser;
use clap::ValueEnum;
use simplelog::LevelFilter;
use tableview_lib::fetch::KeyCase;
use tableview_lib::query::SortClause;

/// Output format for the fetched page
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Page envelope and state as pretty-printed JSON
    Json,
    /// Rows as CSV, header taken from the first row
    Csv,
}

/// Record key casing
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Casing {
    Preserve,
    Camel,
    Snake,
}

impl From<Casing> for KeyCase {
    fn from(casing: Casing) -> Self {
        match casing {
            Casing::Preserve => KeyCase::Preserve,
            Casing::Camel => KeyCase::Camel,
            Casing::Snake => KeyCase::Snake,
        }
    }
}

/// Command-line arguments for tableview
#[derive(Parser, Debug)]
#[command(name = "tableview", version, about = "Fetch one page of a remote table")]
pub struct Args {
    /// Endpoint template, e.g. https://lms.example.com/api/{scope}/enrollments/
    #[arg(long = "url", env = "TABLEVIEW_URL")]
    pub url: String,

    /// Value substituted for {scope} in the endpoint template
    #[arg(long = "scope", default_value = "")]
    pub scope: String,

    /// Table id used for state, analytics and the page query parameter
    #[arg(long = "table", default_value = "table")]
    pub table: String,

    /// One-based page number
    #[arg(long = "page", default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub page: u64,

    /// Query string to read `{table}-page` from, overriding --page
    #[arg(long = "location-query")]
    pub location_query: Option<String>,

    /// Rows per page
    #[arg(long = "page-size", default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
    pub page_size: u64,

    /// Sort column, `-` prefix for descending. Repeatable, first wins.
    #[arg(long = "sort", value_parser = parse_sort, allow_hyphen_values = true)]
    pub sort: Vec<SortClause>,

    /// Column to API field mapping as `column=field`. Repeatable.
    #[arg(long = "column", value_parser = parse_pair)]
    pub columns: Vec<(String, String)>,

    /// Free-text search
    #[arg(long = "search")]
    pub search: Option<String>,

    /// Filter sent under its own key as `key=value`. Repeatable.
    #[arg(long = "filter", value_parser = parse_pair)]
    pub filters: Vec<(String, String)>,

    /// Static option sent with every request as `key=value`. Repeatable.
    #[arg(long = "option", value_parser = parse_pair)]
    pub options: Vec<(String, String)>,

    /// Record key casing applied to fetched rows
    #[arg(long = "key-case", value_enum, default_value_t = Casing::Preserve)]
    pub key_case: Casing,

    /// Request timeout in seconds
    #[arg(long = "timeout", default_value_t = 30)]
    pub timeout: u64,

    /// Treat 404 as an error instead of an empty page
    #[arg(long = "strict", action)]
    pub strict: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "warn", env = "TABLEVIEW_LOG")]
    pub log_level: LevelFilter,

    /// Write logs to this file instead of stderr
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}

fn parse_sort(raw: &str) -> Result<SortClause, String> {
    let clause = match raw.strip_prefix('-') {
        Some(column) => SortClause::desc(column),
        None => SortClause::asc(raw),
    };
    if clause.column_id().is_empty() {
        return Err("sort column must not be empty".to_string());
    }
    Ok(clause)
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected `key=value`, got `{}`", raw)),
    }
}
