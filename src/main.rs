//! mustang-align - pairwise MUSTANG alignments for a set of structures
//!
//! Command line entry point. It initializes:
//! - Logging (console, plus rotating file logs with `--log-dir`)
//! - Settings ([`ConfigManager`] for `--config`, then command line overrides)
//! - Tokio runtime (the batch waits on MUSTANG subprocesses asynchronously)
//! - [`BatchRunner`] for the selected mode
//!
//! # Modes
//!
//! - `all <INPUT_DIR> <OUTPUT_DIR>`: every structure against every structure (N² jobs)
//! - `pair <FILE1> <FILE2> <OUTPUT_DIR>`: a single alignment
//!
//! Exits non-zero only for configuration errors; pairs that failed are
//! listed after the summary line.

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use mustang_align::services::ProgressBarSink;
use mustang_align::{
    APP_NAME, AlignerSettings, BatchInput, BatchRunner, ConfigManager, ReconcileMode, VERSION,
};

#[derive(Parser)]
#[command(name = "mustang-align")]
#[command(about = "Pairwise MUSTANG structural alignments for a set of PDB files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the MUSTANG executable (default: bundled bin/mustang-3.2.4)
    #[arg(long, global = true, value_name = "PATH")]
    mustang_path: Option<Utf8PathBuf>,

    /// Output alignment format passed to MUSTANG's -F flag
    #[arg(long, global = true, value_name = "FORMAT")]
    alignment_format: Option<String>,

    /// Percentage of CPU cores to use (default: 25)
    #[arg(long, global = true, value_name = "PERCENT")]
    cpu_percentage: Option<f64>,

    /// Only require the alignment file; discard MUSTANG's superposed PDB
    #[arg(long, global = true)]
    lenient: bool,

    /// Directory for pairwise alignments (default: <OUTPUT_DIR>/pairwise_alignments)
    #[arg(long, global = true, value_name = "DIR")]
    pairwise_dir: Option<Utf8PathBuf>,

    /// YAML settings file; command line flags override its values
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<Utf8PathBuf>,

    /// Also write daily rotating log files to this directory
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<Utf8PathBuf>,

    /// Write the rotating log files as JSON lines (requires --log-dir)
    #[arg(long, global = true, requires = "log_dir")]
    log_json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Align every structure in a directory against every structure
    All {
        /// Directory containing input PDB files
        input_dir: Utf8PathBuf,

        /// Output directory for alignment results
        output_dir: Utf8PathBuf,
    },

    /// Align exactly two structures
    Pair {
        /// First PDB file
        first: Utf8PathBuf,

        /// Second PDB file
        second: Utf8PathBuf,

        /// Output directory for alignment results
        output_dir: Utf8PathBuf,
    },
}

impl Cli {
    fn apply_overrides(&self, settings: &mut AlignerSettings) {
        if let Some(path) = &self.mustang_path {
            settings.mustang_path = Some(path.clone());
        }
        if let Some(format) = &self.alignment_format {
            settings.alignment_format = format.clone();
        }
        if let Some(percentage) = self.cpu_percentage {
            settings.cpu_percentage = percentage;
        }
        if self.lenient {
            settings.reconcile_mode = ReconcileMode::Lenient;
        }
        if let Some(dir) = &self.pairwise_dir {
            settings.pairwise_dir = Some(dir.clone());
        }
    }

    fn batch_input(&self) -> (BatchInput, Utf8PathBuf) {
        match &self.command {
            Commands::All {
                input_dir,
                output_dir,
            } => (BatchInput::Directory(input_dir.clone()), output_dir.clone()),
            Commands::Pair {
                first,
                second,
                output_dir,
            } => (
                BatchInput::Pair(first.clone(), second.clone()),
                output_dir.clone(),
            ),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = mustang_align::logging::setup_logging(
        cli.log_dir.as_deref(),
        APP_NAME,
        cli.verbose,
        cli.log_json,
    )?;
    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let mut settings = match &cli.config {
        Some(path) => ConfigManager::new(path).load_settings()?,
        None => AlignerSettings::default(),
    };
    cli.apply_overrides(&mut settings);

    let (input, output_dir) = cli.batch_input();
    let runner = BatchRunner::new(settings, output_dir)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("mustang-worker")
        .build()?;

    tracing::info!(
        "Running with up to {} concurrent MUSTANG processes, format {}, {:?} mode",
        runner.concurrency(),
        runner.settings().alignment_format,
        runner.settings().reconcile_mode
    );

    let progress = ProgressBarSink::new();
    let summary = runtime.block_on(runner.run(&input, &progress))?;

    if summary.expected() == 0 {
        println!("No structures to align");
        return Ok(());
    }

    println!("{}", summary.summary());
    if let Some(coordinate_dir) = &summary.layout().coordinate_dir {
        println!("Superposed structures written to {}", coordinate_dir);
    }
    for failure in summary.failures() {
        println!("FAILED {}: {}", failure.pair_id, failure.reason);
    }

    Ok(())
}
