//! CLI entry point for the weather-station imputation engine.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use meteo_impute::{
    ColumnProfile, ImputationConfig, ImputationStrategy, Imputer, RunSummary, frame,
};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// CLI-compatible strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliStrategy {
    /// Causal rolling-window median of recent valid values
    Rolling,
    /// Linear interpolation between the nearest valid values
    Interpolation,
}

impl From<CliStrategy> for ImputationStrategy {
    fn from(cli: CliStrategy) -> Self {
        match cli {
            CliStrategy::Rolling => ImputationStrategy::Rolling,
            CliStrategy::Interpolation => ImputationStrategy::Interpolation,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Sensor-aware missing value imputation for weather-station CSV exports",
    long_about = "Fills missing, out-of-range and garbled numeric cells in weather-station \
                  telemetry while leaving valid observations untouched.\n\n\
                  EXAMPLES:\n  \
                  # Rolling-window imputation with defaults\n  \
                  meteo-impute -i station.csv\n\n  \
                  # Interpolation with an explicit output path\n  \
                  meteo-impute -i station.csv -s interpolation -o filled.csv\n\n  \
                  # Preview column classification without imputing\n  \
                  meteo-impute -i station.csv --dry-run\n\n  \
                  # Machine-readable run summary\n  \
                  meteo-impute -i station.csv --json | jq .values_imputed"
)]
struct Args {
    /// Path to the CSV file to impute
    #[arg(short, long)]
    input: String,

    /// Output CSV path
    ///
    /// If not specified, writes "<input_stem>_imputed.csv" next to the input
    #[arg(short, long)]
    output: Option<String>,

    /// Estimation strategy [default: rolling]
    #[arg(short, long, value_enum)]
    strategy: Option<CliStrategy>,

    /// Rolling window size (number of recent valid values per column)
    #[arg(short, long)]
    window_size: Option<usize>,

    /// Minutes between consecutive rows, used for the diurnal fallback
    #[arg(long)]
    interval: Option<u32>,

    /// Number of leading rows sampled for distribution statistics
    #[arg(long)]
    sample_rows: Option<usize>,

    /// JSON configuration file
    ///
    /// Command-line flags take precedence over values in the file
    #[arg(short, long)]
    config: Option<String>,

    /// Treat the wider marker set (n/a, ----, #N/A, ...) as missing
    #[arg(long)]
    extended_tokens: bool,

    /// Derive the hour of day from the datetime column when it parses
    #[arg(long)]
    timestamp_hours: bool,

    /// Number of lines to skip before the header
    #[arg(long, default_value = "0")]
    skip_rows: usize,

    /// Print the column classification without imputing
    #[arg(long)]
    dry_run: bool,

    /// Output the run summary as JSON to stdout
    ///
    /// Disables all progress logs; only outputs the final JSON summary.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,
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
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = build_config(&args)?;
    let mut builder = Imputer::builder().config(config);
    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }
    let imputer = builder.build()?;

    info!("Loading dataset from: {}", args.input);
    let df = frame::read_csv(&args.input, args.skip_rows)?;
    info!("Dataset loaded successfully: {:?}", df.shape());

    let headers = frame::headers(&df);
    let rows = frame::dataframe_to_rows(&df)?;
    drop(df);

    if args.dry_run {
        let profiles = imputer.profile(&rows)?;
        print_classification(&args, rows.len(), &profiles);
        return Ok(());
    }

    let output = match imputer.impute(rows) {
        Ok(output) => output,
        Err(e) => {
            error!("Imputation failed: {}", e);
            return Err(anyhow!("Imputation failed: {}", e));
        }
    };

    let output_path = resolve_output_path(&args);
    let mut out = frame::rows_to_dataframe(&headers, &output.rows)?;
    frame::write_csv(&mut out, &output_path)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output.summary)?);
    } else {
        print_summary(&output.summary, &output_path);
    }

    Ok(())
}

/// Merge the optional JSON config file with command-line flags.
fn build_config(args: &Args) -> Result<ImputationConfig> {
    let mut config = match &args.config {
        Some(path) => ImputationConfig::from_json_file(path)?,
        None => ImputationConfig::default(),
    };

    if let Some(strategy) = args.strategy {
        config.strategy = strategy.into();
    }
    if let Some(size) = args.window_size {
        config.window_size = size;
    }
    if let Some(minutes) = args.interval {
        config.sample_interval_minutes = minutes;
    }
    if let Some(rows) = args.sample_rows {
        config.sample_rows = rows;
    }
    if args.extended_tokens {
        config.missing_tokens = ImputationConfig::extended_missing_tokens();
    }
    if args.timestamp_hours {
        config.timestamp_hours = true;
    }

    config.validate()?;
    Ok(config)
}

fn resolve_output_path(args: &Args) -> PathBuf {
    if let Some(output) = &args.output {
        return PathBuf::from(output);
    }
    let input = Path::new(&args.input);
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    input.with_file_name(format!("{stem}_imputed.csv"))
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

/// Print the dry-run classification table.
///
/// Uses `println!` intentionally: this is the primary output of --dry-run
/// and should be visible regardless of log level.
fn print_classification(args: &Args, rows: usize, profiles: &[ColumnProfile]) {
    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Column classification");
    println!("{}\n", "=".repeat(80));

    println!("  File: {}", args.input);
    println!("  Rows: {}", rows);
    println!("  Columns: {}", profiles.len());
    println!();

    println!(
        "{:<24} {:<16} {:<10} {:<10} {:<10} {:<10}",
        "Column", "Sensor", "Kind", "Numeric %", "Missing %", "Median"
    );
    println!("{}", "-".repeat(80));

    for profile in profiles {
        let (numeric, missing, median) = match &profile.sample {
            Some(sample) => (
                format!("{:.1}", sample.counts.numeric_ratio() * 100.0),
                format!("{:.1}", sample.counts.missing_ratio() * 100.0),
                sample
                    .stats
                    .as_ref()
                    .map(|s| format!("{:.2}", s.median))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        println!(
            "{:<24} {:<16} {:<10} {:<10} {:<10} {:<10}",
            truncate_str(&profile.name, 23),
            profile.sensor.as_str(),
            profile.kind.as_str(),
            numeric,
            missing,
            median
        );
    }

    println!("{}", "=".repeat(80));
    println!("To impute, run without --dry-run");
    println!("{}", "=".repeat(80));
}

fn print_summary(summary: &RunSummary, output_path: &Path) {
    println!();
    println!("{}", "=".repeat(80));
    println!("IMPUTATION COMPLETE");
    println!("{}", "=".repeat(80));
    println!();
    println!("Strategy: {}", summary.strategy.as_str());
    println!("Output: {}", output_path.display());
    println!();
    println!("Run Summary:");
    println!("  Duration: {}ms ({:.0} rows/s)", summary.duration_ms, summary.rows_per_second);
    println!("  Rows processed: {}", summary.rows_processed);
    println!(
        "  Values imputed: {} ({} fallback, {:.1}% estimated)",
        summary.values_imputed,
        summary.values_fallback,
        summary.interpolation_ratio * 100.0
    );
    println!("  Rejected observations: {}", summary.rejected_observations);
    println!("  Text anomalies: {}", summary.text_anomalies);
    println!();

    let touched: Vec<_> = summary
        .columns
        .iter()
        .filter(|c| c.imputed > 0 || c.missing > 0)
        .collect();
    if !touched.is_empty() {
        println!("Columns:");
        for column in touched {
            println!(
                "  - {} [{}]: {} imputed, {} fallback, {:.1}% missing",
                column.name,
                column.sensor,
                column.imputed,
                column.fallback,
                column.missing_ratio * 100.0
            );
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}
