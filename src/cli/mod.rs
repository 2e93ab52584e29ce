//! # CLI Module
//!
//! Command-line interface for the photo archiver.
//!
//! ## Usage
//! ```bash
//! # Evaluate raw folders against the archive, writing the log
//! photo-archive evaluate raw --archive processed
//!
//! # Custom similarity thresholds
//! photo-archive evaluate raw --date-window 5 --similarity-threshold 4
//!
//! # JSON output for scripting
//! photo-archive evaluate raw --output json
//!
//! # Execute the log: import pending files, move duplicates aside
//! photo-archive process --archive processed --duplicates-dir duplicates
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use photo_archiver::core::detector::SimilarityConfig;
use photo_archiver::core::execute::{process, ProcessOptions};
use photo_archiver::core::export::write_log_file;
use photo_archiver::core::plan::{EvaluationConfig, EvaluationPlanBuilder, RecordStatus};
use photo_archiver::core::scanner::ScanConfig;
use photo_archiver::error::Result;
use std::path::PathBuf;
use std::time::Duration;

/// Photo Archiver - deduplicate and import photos chronologically
#[derive(Parser, Debug)]
#[command(name = "photo-archive")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate raw folders and write the evaluation log
    Evaluate {
        /// Raw source directories
        #[arg(default_value = "raw")]
        raw_dirs: Vec<PathBuf>,

        /// Processed archive root
        #[arg(short, long, default_value = "processed")]
        archive: PathBuf,

        /// Evaluation log path
        #[arg(short, long, default_value = "evaluation_log.csv")]
        log: PathBuf,

        /// Size ceiling for the "compressed" side of a similarity pair
        #[arg(long, default_value = "1000000")]
        compressed_max: u64,

        /// Size floor for the "original" side of a similarity pair
        #[arg(long, default_value = "1200000")]
        original_min: u64,

        /// Date-proximity window for similarity candidates, in days
        #[arg(long, default_value = "10")]
        date_window: i64,

        /// Maximum fingerprint distance for a similarity match
        #[arg(long, default_value = "8")]
        similarity_threshold: u32,

        /// Keep .mov clips paired with .heic stills
        #[arg(long)]
        keep_live_clips: bool,

        /// Extensions to exclude from evaluation
        #[arg(long = "exclude-ext", default_value = ".aae")]
        excluded_extensions: Vec<String>,

        /// Include hidden files
        #[arg(long)]
        include_hidden: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Execute a previously written evaluation log
    Process {
        /// Evaluation log path
        #[arg(short, long, default_value = "evaluation_log.csv")]
        log: PathBuf,

        /// Processed archive root
        #[arg(short, long, default_value = "processed")]
        archive: PathBuf,

        /// Move duplicate sources into this folder (left in place if unset)
        #[arg(long)]
        duplicates_dir: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary with colors
    Pretty,
    /// JSON records for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    photo_archiver::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            raw_dirs,
            archive,
            log,
            compressed_max,
            original_min,
            date_window,
            similarity_threshold,
            keep_live_clips,
            excluded_extensions,
            include_hidden,
            output,
        } => {
            let config = EvaluationConfig {
                raw_dirs,
                archive_dir: archive,
                scan: ScanConfig {
                    include_hidden,
                    excluded_extensions,
                    skip_live_photo_clips: !keep_live_clips,
                    ..Default::default()
                },
                similarity: SimilarityConfig {
                    compressed_max_bytes: compressed_max,
                    original_min_bytes: original_min,
                    date_window_days: date_window,
                    distance_threshold: similarity_threshold,
                },
            };
            run_evaluate(&config, &log, output)
        }
        Commands::Process {
            log,
            archive,
            duplicates_dir,
        } => run_process(&ProcessOptions {
            log_path: log,
            processed_dir: archive,
            duplicates_dir,
        }),
    }
}

fn run_evaluate(config: &EvaluationConfig, log: &PathBuf, output: OutputFormat) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .expect("valid progress template"),
    );
    spinner.set_message("evaluating...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcome = EvaluationPlanBuilder::evaluate(config)?;
    spinner.finish_and_clear();

    write_log_file(&outcome.plan.records, log)?;

    match output {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome.plan.records)
                    .expect("plan records serialize")
            );
        }
        OutputFormat::Pretty => {
            println!(
                "{} {} evaluated, {} to import, {} duplicates, {} errors",
                style("Evaluation complete:").green().bold(),
                outcome.plan.len(),
                style(outcome.plan.pending_count()).green(),
                style(outcome.plan.duplicate_count()).yellow(),
                style(outcome.plan.error_count()).red(),
            );

            for record in &outcome.plan.records {
                if record.status == RecordStatus::Duplicate {
                    println!(
                        "  {} {} -> {}",
                        style("duplicate").yellow(),
                        record.source.display(),
                        record
                            .duplicate_of
                            .as_ref()
                            .map(|p| p.display().to_string())
                            .unwrap_or_default(),
                    );
                }
            }

            for error in &outcome.scan_errors {
                eprintln!("  {} {}", style("warning").yellow(), error);
            }

            println!("Log written to {}", log.display());
        }
    }

    Ok(())
}

fn run_process(options: &ProcessOptions) -> Result<()> {
    let report = process(options)?;

    println!(
        "{} {} copied, {} converted, {} duplicates moved, {} failed, {} skipped",
        style("Processing complete:").green().bold(),
        report.copied,
        report.converted,
        style(report.duplicates_moved).yellow(),
        style(report.failed).red(),
        report.skipped,
    );

    Ok(())
}
