mod cli;

use std::fs::File;
use std::time::Duration;

use clap::Parser;
use serde_json::json;
use simplelog::Config;
use simplelog::WriteLogger;
use tableview_lib::TableController;
use tableview_lib::TableStore;
use tableview_lib::analytics::LogAnalytics;
use tableview_lib::deeplink::page_index_from_query;
use tableview_lib::error::FetchError;
use tableview_lib::export::to_csv;
use tableview_lib::fetch::HttpFetcher;
use tableview_lib::normalize::ErrorNormalizer;
use tableview_lib::query::ColumnFieldMap;
use tableview_lib::query::FilterRules;
use tableview_lib::query::TableQuery;
use tableview_lib::query::Translator;

use crate::cli::Args;
use crate::cli::OutputFormat;

const SEARCH_FILTER: &str = "search";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Failed to initialize logger: {0}")]
    Logger(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Table(String),

    #[error("Failed to write output: {0}")]
    Output(#[from] serde_json::Error),
}

fn init_logging(args: &Args) -> Result<(), CliError> {
    let result = match &args.log_file {
        Some(path) => {
            let file = File::create(path).map_err(|e| CliError::Logger(e.to_string()))?;
            WriteLogger::init(args.log_level, Config::default(), file)
        }
        None => WriteLogger::init(args.log_level, Config::default(), std::io::stderr()),
    };
    result.map_err(|e| CliError::Logger(e.to_string()))
}

fn build_translator(args: &Args) -> Translator {
    let columns: ColumnFieldMap = args.columns.iter().cloned().collect();

    let mut rules = FilterRules::new().search(SEARCH_FILTER, "search");
    for (key, _) in &args.filters {
        rules = rules.param(key.clone(), key.clone());
    }

    args.options
        .iter()
        .fold(Translator::new().columns(columns).filters(rules), |translator, (key, value)| {
            translator.static_option(key.clone(), value.clone())
        })
}

fn build_query(args: &Args) -> TableQuery {
    let page_index = args
        .location_query
        .as_deref()
        .and_then(|query| page_index_from_query(&args.table, query))
        .unwrap_or(args.page as usize - 1);

    let mut query = TableQuery::new(page_index, args.page_size as usize);
    for clause in &args.sort {
        query = query.sort_by(clause.clone());
    }
    if let Some(search) = &args.search {
        query = query.filter(SEARCH_FILTER, search.clone());
    }
    for (key, value) in &args.filters {
        query = query.filter(key.clone(), value.clone());
    }
    query
}

async fn run(args: Args) -> Result<(), CliError> {
    let fetcher = HttpFetcher::builder()
        .url(args.url.clone())
        .timeout(Duration::from_secs(args.timeout))
        .key_case(args.key_case.into())
        .build()?;

    let normalizer = if args.strict {
        ErrorNormalizer::strict()
    } else {
        ErrorNormalizer::default()
    };

    let controller = TableController::builder()
        .table_id(args.table.clone())
        .fetcher(fetcher)
        .scope_id(args.scope.clone())
        .store(TableStore::new())
        .translator(build_translator(&args))
        .normalizer(normalizer)
        .analytics(LogAnalytics)
        .build();

    let query = build_query(&args);
    log::info!(
        "fetching table `{}` page {} ({} rows per page)",
        args.table,
        query.page_index() + 1,
        query.page_size()
    );
    controller.fetch_immediate(query).await;

    let state = controller
        .state()
        .ok_or_else(|| CliError::Table(format!("table `{}` is not mounted", args.table)))?;
    if let Some(error) = state.last_error {
        return Err(CliError::Table(error.to_string()));
    }

    match args.format {
        OutputFormat::Json => {
            let output = json!({
                "tableId": args.table,
                "data": state.data,
                "fetchedAt": state.fetched_at,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Csv => {
            let csv = to_csv(state.data.results());
            if !csv.is_empty() {
                println!("{}", csv);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
