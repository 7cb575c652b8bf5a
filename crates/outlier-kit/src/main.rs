//! CLI entry point for outlier detection and handling.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use outlier_kit::{
    CleaningOutcome, CleaningPlan, DetectionMethod, HandlingStrategy, InterpolationMethod,
    OutlierError, OutlierPipeline,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// CLI-compatible detection method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMethod {
    /// Interquartile range fences
    Iqr,
    /// Standard score against mean and std-dev
    Zscore,
    /// Modified z-score against median and MAD
    Mad,
    /// Fixed quantile band
    Percentile,
}

impl From<CliMethod> for DetectionMethod {
    fn from(cli: CliMethod) -> Self {
        match cli {
            CliMethod::Iqr => DetectionMethod::Iqr,
            CliMethod::Zscore => DetectionMethod::ZScore,
            CliMethod::Mad => DetectionMethod::Mad,
            CliMethod::Percentile => DetectionMethod::Percentile,
        }
    }
}

/// CLI-compatible handling strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliStrategy {
    /// Drop rows containing outliers
    Remove,
    /// Replace outliers with the mean of the other values
    Mean,
    /// Replace outliers with the median of the other values
    Median,
    /// Clip values to the --limits-lower/--limits-upper quantiles
    Winsorization,
    /// Replace outliers with --fill-value
    Constant,
    /// Fill outliers from neighbouring rows
    Interpolation,
    /// Replace outliers with the median of their --group-col group
    #[value(name = "group_based", alias = "group-based")]
    GroupBased,
}

impl From<CliStrategy> for HandlingStrategy {
    fn from(cli: CliStrategy) -> Self {
        match cli {
            CliStrategy::Remove => HandlingStrategy::Remove,
            CliStrategy::Mean => HandlingStrategy::Mean,
            CliStrategy::Median => HandlingStrategy::Median,
            CliStrategy::Winsorization => HandlingStrategy::Winsorization,
            CliStrategy::Constant => HandlingStrategy::Constant,
            CliStrategy::Interpolation => HandlingStrategy::Interpolation,
            CliStrategy::GroupBased => HandlingStrategy::GroupBased,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Outlier detection and handling for CSV data",
    long_about = "Detects outliers in the numeric columns of a CSV file and treats them.\n\n\
                  EXAMPLES:\n  \
                  # IQR detection, median replacement\n  \
                  outlier-kit -i data.csv -o clean.csv --strategy median\n\n  \
                  # Modified z-score on two columns, drop flagged rows\n  \
                  outlier-kit -i data.csv --method mad --columns price,qty --strategy remove\n\n  \
                  # Winsorize at the 1st/99th percentiles\n  \
                  outlier-kit -i data.csv --strategy winsorization --limits-lower 0.01 --limits-upper 0.99\n\n  \
                  # Run a saved plan and print the JSON report\n  \
                  outlier-kit -i data.csv --plan plan.json --json"
)]
struct Args {
    /// Path to the CSV file to process
    #[arg(short, long)]
    input: String,

    /// Where to write the cleaned CSV
    ///
    /// If not specified, the cleaned table is not written
    #[arg(short, long)]
    output: Option<String>,

    /// JSON cleaning plan; the flags below override its fields
    #[arg(short, long)]
    plan: Option<String>,

    /// Detection method
    #[arg(short, long, value_enum)]
    method: Option<CliMethod>,

    /// Threshold for iqr, zscore and mad
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Lower quantile for the percentile method
    #[arg(long, requires = "upper")]
    lower: Option<f64>,

    /// Upper quantile for the percentile method
    #[arg(long, requires = "lower")]
    upper: Option<f64>,

    /// Handling strategy
    #[arg(short, long, value_enum)]
    strategy: Option<CliStrategy>,

    /// Comma-separated columns to process (default: all numeric columns)
    #[arg(short, long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Replacement value for the constant strategy
    #[arg(long, allow_hyphen_values = true)]
    fill_value: Option<f64>,

    /// Grouping column for the group_based strategy
    #[arg(long)]
    group_col: Option<String>,

    /// Lower quantile limit for winsorization
    #[arg(long, requires = "limits_upper")]
    limits_lower: Option<f64>,

    /// Upper quantile limit for winsorization
    #[arg(long, requires = "limits_lower")]
    limits_upper: Option<f64>,

    /// Gap filling for the interpolation strategy (linear, nearest)
    #[arg(long)]
    interpolation: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    match run(&args) {
        Ok(()) => Ok(()),
        Err(e) => {
            if args.json {
                println!("{}", error_json(&e)?);
            } else {
                error!("Outlier processing failed");
            }
            Err(e)
        }
    }
}

fn run(args: &Args) -> Result<()> {
    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let plan = build_plan(args)?;
    let pipeline = OutlierPipeline::new(plan)?;

    info!("Loading dataset from: {}", args.input);
    let data = load_csv(&args.input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    let mut outcome = pipeline.run(&data)?;

    if let Some(output) = &args.output {
        write_csv(&mut outcome.data, output)?;
        info!("Cleaned dataset saved: {}", output);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    } else {
        print_human_readable_summary(&outcome, args);
    }
    Ok(())
}

/// Start from `--plan` (or the defaults) and apply the command-line overrides.
fn build_plan(args: &Args) -> Result<CleaningPlan> {
    let mut plan = match &args.plan {
        Some(path) => CleaningPlan::from_json_file(path)?,
        None => CleaningPlan::default(),
    };

    if let Some(method) = args.method {
        plan.detector.method = method.into();
    }
    if args.threshold.is_some() {
        plan.detector.threshold = args.threshold;
    }
    if let (Some(lower), Some(upper)) = (args.lower, args.upper) {
        plan.detector.percentiles = Some((lower, upper));
    }
    if let Some(columns) = &args.columns {
        plan.detector.columns = Some(columns.clone());
        plan.handler.columns = Some(columns.clone());
    }
    if let Some(strategy) = args.strategy {
        plan.handler.strategy = HandlingStrategy::from(strategy).as_str().to_string();
    }
    if args.fill_value.is_some() {
        plan.handler.fill_value = args.fill_value;
    }
    if args.group_col.is_some() {
        plan.handler.group_col = args.group_col.clone();
    }
    if let (Some(lower), Some(upper)) = (args.limits_lower, args.limits_upper) {
        plan.handler.limits = Some((lower, upper));
    }
    if let Some(name) = &args.interpolation {
        // Parse early so a typo is reported before the file is loaded.
        name.parse::<InterpolationMethod>()?;
        plan.handler.interpolation = Some(name.clone());
    }

    plan.validate()?;
    Ok(plan)
}

fn load_csv(path: &str) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
        .map_err(|e| anyhow!("Failed to read '{}': {}", path, e))
}

fn write_csv(df: &mut DataFrame, path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)?;
    Ok(())
}

/// JSON body printed for a failed run in `--json` mode.
fn error_json(e: &anyhow::Error) -> Result<String> {
    let value = match e.downcast_ref::<OutlierError>() {
        Some(err) => serde_json::json!({ "error": err }),
        None => serde_json::json!({
            "error": { "code": outlier_kit::error::UNKNOWN_CODE, "component": null, "message": e.to_string() }
        }),
    };
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Print a human-readable summary of the cleaning run.
fn print_human_readable_summary(outcome: &CleaningOutcome, args: &Args) {
    let report = &outcome.report;

    println!();
    println!("{}", "=".repeat(80));
    println!("OUTLIER PROCESSING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!("  File: {}", args.input);
    match &report.detector {
        Some(detector) => println!("  Detector: {}", detector),
        None => println!("  Detector: skipped"),
    }
    println!("  Strategy: {}", report.strategy);
    println!(
        "  Rows: {} -> {} ({} removed)",
        report.rows_before,
        report.rows_after,
        report.rows_removed()
    );
    println!("  Duration: {}ms", report.duration_ms);
    println!();

    if !report.outliers_per_column.is_empty() {
        println!("{:<30} {:>10}", "Column", "Outliers");
        println!("{}", "-".repeat(41));
        for entry in &report.outliers_per_column {
            println!("{:<30} {:>10}", truncate_str(&entry.column, 29), entry.outliers);
        }
        println!("{}", "-".repeat(41));
        println!("{:<30} {:>10}", "Total", report.total_outliers);
        println!();
    }

    match &args.output {
        Some(output) => println!("Cleaned data written to {}", output),
        None => println!("No --output given, cleaned data was not written"),
    }
}

/// Truncate a string to a maximum length, adding "..." if truncated.
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
