//! CLI entry point for the bikeshare reporter tool.
//!
//! Provides subcommands for each pipeline stage (ingest, clean, analyze,
//! report) plus a convenience command that runs all four in sequence.

use anyhow::Result;
use bikeshare_reporter::analyzers::analyzer::analyze_file;
use bikeshare_reporter::clean::clean_file;
use bikeshare_reporter::ingest::combine_directory;
use bikeshare_reporter::report::render_report;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bikeshare_reporter")]
#[command(about = "Combines, cleans, and reports on bicycle-trip CSV extracts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Combine a directory of monthly CSV extracts into one file
    Ingest {
        /// Directory containing the raw CSV extracts
        #[arg(short, long, value_name = "DIR")]
        input_dir: String,

        /// Combined CSV file to write
        #[arg(short, long, default_value = "combined_raw.csv")]
        output: String,
    },
    /// Normalize columns, derive ride features, and filter invalid rows
    Clean {
        /// Combined CSV file to clean
        #[arg(short, long, default_value = "combined_raw.csv")]
        input: String,

        /// Cleaned CSV file to write
        #[arg(short, long, default_value = "cleaned.csv")]
        output: String,
    },
    /// Aggregate the cleaned table into summary CSVs
    Analyze {
        /// Cleaned CSV file to aggregate
        #[arg(short, long, default_value = "cleaned.csv")]
        input: String,

        /// Directory to write the summary CSVs into
        #[arg(short = 'd', long, default_value = "summary")]
        output_dir: String,
    },
    /// Render the bar chart and the PDF report from the summaries
    Report {
        /// Directory containing the summary CSVs
        #[arg(short, long, default_value = "summary")]
        summary_dir: String,

        /// Bar chart PNG to write
        #[arg(long, default_value = "figures/avg_duration.png")]
        chart: String,

        /// Multi-page PDF report to write
        #[arg(long, default_value = "figures/report.pdf")]
        report: String,
    },
    /// Run all four stages in sequence inside a work directory
    Run {
        /// Directory containing the raw CSV extracts
        #[arg(short, long, value_name = "DIR")]
        input_dir: String,

        /// Directory for intermediate and final outputs
        #[arg(short, long, default_value = "work")]
        work_dir: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/bikeshare_reporter.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bikeshare_reporter.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest { input_dir, output } => {
            combine_directory(Path::new(&input_dir), Path::new(&output))?;
        }
        Commands::Clean { input, output } => {
            clean_file(Path::new(&input), Path::new(&output))?;
        }
        Commands::Analyze { input, output_dir } => {
            analyze_file(Path::new(&input), Path::new(&output_dir))?;
        }
        Commands::Report {
            summary_dir,
            chart,
            report,
        } => {
            render_report(Path::new(&summary_dir), Path::new(&chart), Path::new(&report))?;
        }
        Commands::Run {
            input_dir,
            work_dir,
        } => {
            run_pipeline(Path::new(&input_dir), Path::new(&work_dir))?;
        }
    }

    Ok(())
}

/// Executes the full pipeline with conventional filenames inside `work_dir`.
#[tracing::instrument(skip_all, fields(input_dir = %input_dir.display(), work_dir = %work_dir.display()))]
fn run_pipeline(input_dir: &Path, work_dir: &Path) -> Result<()> {
    let combined = work_dir.join("combined_raw.csv");
    let cleaned = work_dir.join("cleaned.csv");
    let summary_dir = work_dir.join("summary");
    let chart = work_dir.join("figures/avg_duration.png");
    let report = work_dir.join("figures/report.pdf");

    combine_directory(input_dir, &combined)?;
    clean_file(&combined, &cleaned)?;
    analyze_file(&cleaned, &summary_dir)?;
    render_report(&summary_dir, &chart, &report)?;

    info!("Pipeline complete");
    Ok(())
}
