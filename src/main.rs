//! cordscope - CORD-19 metadata explorer
//!
//! Cleans a CORD-19 `metadata.csv`, writes summary tables, or serves them as JSON for a
//! dashboard front end.
//!
//! ## Usage
//!
//! ### Report Mode
//! ```bash
//! cordscope analyze data/metadata.csv --sample 10000 --top-journals 15
//! ```
//!
//! ### Dashboard API Mode
//! ```bash
//! cordscope serve data/metadata.csv --port 3000
//! ```

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use cordscope::{
    aggregate::{self, month_label, AggregateTable},
    config::PipelineConfig,
    dataset::{CleanedDataset, RecordFilter, Schema},
    error::OptionExt,
    io, pipeline, prune,
    record::CleanedRecord,
    summary::{self, SummaryStatistics},
    CordError,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// CORD-19 metadata cleaning and aggregation
#[derive(Parser)]
#[command(name = "cordscope")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that runs the pipeline
#[derive(Args)]
struct PipelineArgs {
    /// Path to metadata.csv
    input: PathBuf,

    /// Only load the first N rows
    #[arg(long)]
    sample: Option<usize>,

    /// JSON config file (missing keys use defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Drop columns whose missing ratio exceeds this value
    #[arg(long)]
    missing_threshold: Option<f64>,

    /// Separator between names in the authors column
    #[arg(long)]
    author_delimiter: Option<String>,

    /// Number of journals in the top-journals table
    #[arg(long)]
    top_journals: Option<usize>,

    /// Number of words in the title word table
    #[arg(long)]
    top_words: Option<usize>,

    /// Minimum title word length
    #[arg(long)]
    min_word_length: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the dataset and write the report files
    Analyze {
        #[command(flatten)]
        args: PipelineArgs,

        /// Output directory
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Keep only papers published in or after this year
        #[arg(long)]
        year_from: Option<i32>,

        /// Keep only papers published in or before this year
        #[arg(long)]
        year_to: Option<i32>,

        /// Drop papers without a title
        #[arg(long)]
        require_title: bool,
    },

    /// Print the per-column missingness profile
    Profile {
        #[command(flatten)]
        args: PipelineArgs,
    },

    /// Serve the cleaned dataset and tables over HTTP
    Serve {
        #[command(flatten)]
        args: PipelineArgs,

        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Analyze {
            args,
            output,
            year_from,
            year_to,
            require_title,
        } => {
            let filter = RecordFilter {
                year_from,
                year_to,
                require_title,
            };
            run_analyze(&args, &output, &filter)
        }
        Commands::Profile { args } => run_profile(&args),
        Commands::Serve { args, port, host } => run_server(&args, host, port).await,
    }
}

/// Resolve the config file plus CLI overrides
fn build_config(args: &PipelineArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(threshold) = args.missing_threshold {
        config.missing_threshold = threshold;
    }
    if let Some(delimiter) = &args.author_delimiter {
        config.author_delimiter = delimiter.clone();
    }
    if let Some(n) = args.top_journals {
        config.top_journals = n;
    }
    if let Some(n) = args.top_words {
        config.words.top_n = n;
    }
    if let Some(len) = args.min_word_length {
        config.words.min_length = len;
    }

    config.validate()?;
    Ok(config)
}

/// Load and clean the input named on the command line
fn load_dataset(args: &PipelineArgs, config: &PipelineConfig) -> Result<CleanedDataset> {
    let raw = io::load_records(&args.input, args.sample)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    Ok(prune::clean(&raw, config))
}

// ============================================================================
// Report
// ============================================================================

fn run_analyze(args: &PipelineArgs, output_dir: &Path, filter: &RecordFilter) -> Result<()> {
    filter.validate()?;
    let config = build_config(args)?;

    let stem = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_invalid("Input path has no file name")?;

    // Create output folder
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let output_folder = output_dir.join(format!("{}_{}", timestamp, stem));
    std::fs::create_dir_all(&output_folder).context("Failed to create output directory")?;

    println!("Output folder: {}", output_folder.display());

    let cleaned = load_dataset(args, &config)?;
    let dataset = cleaned.filter(filter);
    if dataset.is_empty() {
        warn!("No records left after cleaning and filtering");
    }

    let report = pipeline::analyze(&dataset, &config);

    io::write_cleaned_csv(&output_folder.join("cleaned_metadata.csv"), &dataset)?;
    io::write_json(&output_folder.join("report.json"), &report)?;
    io::write_json(&output_folder.join("column_profile.json"), dataset.schema().profiles())?;
    io::write_table_csv(&output_folder.join("publications_by_year.csv"), &report.yearly)?;
    io::write_table_csv(&output_folder.join("publications_by_month.csv"), &report.monthly)?;
    io::write_table_csv(&output_folder.join("top_journals.csv"), &report.journals)?;
    io::write_table_csv(&output_folder.join("title_words.csv"), &report.words)?;
    io::write_table_csv(&output_folder.join("source_distribution.csv"), &report.sources)?;

    print_summary(&report.summary);
    if let Some(trend) = &report.trend {
        println!(
            "Peak year: {} ({} papers), {}-{}",
            trend.peak_year, trend.peak_count, trend.first_year, trend.last_year
        );
        if let Some(growth) = trend.growth_rate {
            println!("Growth rate: {:.1}%", growth);
        }
    }

    println!("\n✓ Analysis complete. Results in: {}", output_folder.display());
    Ok(())
}

fn print_summary(stats: &SummaryStatistics) {
    println!("\n--- Summary ---");
    println!("Total papers:     {}", stats.total_records);
    println!("Unique titles:    {}", stats.unique_titles);
    println!("Unique journals:  {}", stats.unique_journals);
    match (stats.min_year, stats.max_year) {
        (Some(lo), Some(hi)) => println!("Year range:       {}-{}", lo, hi),
        _ => println!("Year range:       N/A"),
    }
    if let Some(avg) = stats.avg_abstract_length {
        println!("Avg abstract:     {:.1} words", avg);
    }
    println!("Complete columns: {}/{}", stats.complete_columns, stats.completeness.len());
}

fn run_profile(args: &PipelineArgs) -> Result<()> {
    let config = build_config(args)?;
    let raw = io::load_records(&args.input, args.sample)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    let schema = prune::plan_schema(&raw, config.missing_threshold);

    println!("{:<14} {:>10} {:>10} {:>9}  status", "column", "missing", "total", "missing%");
    for profile in schema.profiles() {
        println!(
            "{:<14} {:>10} {:>10} {:>8.2}%  {}",
            profile.column.header(),
            profile.missing,
            profile.total,
            profile.missing_ratio * 100.0,
            if profile.dropped { "dropped" } else { "kept" }
        );
    }
    Ok(())
}

// ============================================================================
// Dashboard API
// ============================================================================

async fn run_server(args: &PipelineArgs, host: String, port: u16) -> Result<()> {
    let config = build_config(args)?;
    let dataset = load_dataset(args, &config)?;

    info!(host = %host, port = port, records = dataset.len(), "Starting dashboard API");
    println!("Starting server at http://{}:{}", host, port);

    // The dataset is read-only for the life of the server
    let app_state = Arc::new(AppState { dataset, config });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/schema", get(schema_handler))
        .route("/summary", get(summary_handler))
        .route("/trends/yearly", get(yearly_handler))
        .route("/trends/monthly", get(monthly_handler))
        .route("/journals", get(journals_handler))
        .route("/words", get(words_handler))
        .route("/sources", get(sources_handler))
        .route("/records", get(records_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

struct AppState {
    dataset: CleanedDataset,
    config: PipelineConfig,
}

/// Query parameters accepted by every data endpoint
#[derive(Debug, Deserialize)]
struct ViewParams {
    year_from: Option<i32>,
    year_to: Option<i32>,
    #[serde(default)]
    require_title: bool,
    /// Table length override for `/journals` and `/words`
    n: Option<usize>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl ViewParams {
    fn record_filter(&self) -> RecordFilter {
        RecordFilter {
            year_from: self.year_from,
            year_to: self.year_to,
            require_title: self.require_title,
        }
    }
}

impl AppState {
    /// The dataset narrowed to the request's filter
    fn view(&self, params: &ViewParams) -> Result<Cow<'_, CleanedDataset>, ApiError> {
        let filter = params.record_filter();
        filter.validate()?;
        Ok(self.dataset.filter(&filter))
    }
}

/// Error body returned for rejected requests
#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: String,
}

struct ApiError(CordError);

impl From<CordError> for ApiError {
    fn from(e: CordError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self.0, "Rejected request");
        let body = ErrorResponse {
            status: format!("error: {}", self.0),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

async fn schema_handler(State(state): State<Arc<AppState>>) -> Json<Schema> {
    Json(state.dataset.schema().clone())
}

async fn summary_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewParams>,
) -> ApiResult<SummaryStatistics> {
    let view = state.view(&params)?;
    Ok(Json(summary::summarize(&view)))
}

/// Yearly counts plus the trend headline
#[derive(Debug, Serialize)]
struct YearlyResponse {
    counts: AggregateTable<i32>,
    trend: Option<aggregate::PublicationTrend>,
}

async fn yearly_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewParams>,
) -> ApiResult<YearlyResponse> {
    let view = state.view(&params)?;
    let counts = aggregate::yearly_counts(&view);
    let trend = aggregate::publication_trend(&counts);
    Ok(Json(YearlyResponse { counts, trend }))
}

#[derive(Debug, Serialize)]
struct MonthRow {
    month: u32,
    label: &'static str,
    count: usize,
}

async fn monthly_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewParams>,
) -> ApiResult<Vec<MonthRow>> {
    let view = state.view(&params)?;
    let rows = aggregate::monthly_counts(&view)
        .rows()
        .iter()
        .filter_map(|r| {
            month_label(r.key).map(|label| MonthRow {
                month: r.key,
                label,
                count: r.count,
            })
        })
        .collect();
    Ok(Json(rows))
}

async fn journals_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewParams>,
) -> ApiResult<AggregateTable<String>> {
    let view = state.view(&params)?;
    let n = params.n.unwrap_or(state.config.top_journals);
    Ok(Json(aggregate::top_journals(&view, n)))
}

async fn words_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewParams>,
) -> ApiResult<AggregateTable<String>> {
    let view = state.view(&params)?;
    let mut words = state.config.words.clone();
    if let Some(n) = params.n {
        words.top_n = n;
    }
    Ok(Json(aggregate::title_word_frequency(&view, &words)))
}

async fn sources_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewParams>,
) -> ApiResult<AggregateTable<String>> {
    let view = state.view(&params)?;
    Ok(Json(aggregate::source_distribution(&view)))
}

/// One page of cleaned records
#[derive(Debug, Serialize)]
struct RecordsResponse {
    total: usize,
    offset: usize,
    records: Vec<CleanedRecord>,
}

const DEFAULT_PAGE_SIZE: usize = 100;
const MAX_PAGE_SIZE: usize = DEFAULT_PAGE_SIZE * 10;

impl ViewParams {
    /// `(offset, limit)` with the limit capped at `MAX_PAGE_SIZE`
    fn page(&self) -> (usize, usize) {
        let offset = self.offset.unwrap_or(0);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
        (offset, limit)
    }
}

async fn records_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewParams>,
) -> ApiResult<RecordsResponse> {
    let view = state.view(&params)?;
    let (offset, limit) = params.page();

    let records = view
        .records()
        .iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();

    Ok(Json(RecordsResponse {
        total: view.len(),
        offset,
        records,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(limit: Option<usize>, offset: Option<usize>) -> ViewParams {
        ViewParams {
            year_from: None,
            year_to: None,
            require_title: false,
            n: None,
            limit,
            offset,
        }
    }

    #[test]
    fn test_page_defaults() {
        assert_eq!(params(None, None).page(), (0, DEFAULT_PAGE_SIZE));
        assert_eq!(params(Some(25), Some(50)).page(), (50, 25));
    }

    #[test]
    fn test_page_limit_is_capped() {
        assert_eq!(params(Some(100_000_000), None).page(), (0, MAX_PAGE_SIZE));
    }
}
