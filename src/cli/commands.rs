//! CLI command handlers

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use super::logging::{log, LogLevel};
use crate::dataset::DatasetFile;
use crate::error::{Error, Result};
use crate::split::split;
use crate::validate::validate;

/// Command-line interface for the training core
#[derive(Debug, Parser)]
#[command(
    name = "adiestrar",
    version,
    about = "Training-job admission, validation, and scheduling for object-detection datasets"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Suppress all output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the training API server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1:5000")]
        addr: SocketAddr,

        /// Maximum concurrent training jobs
        #[arg(long, default_value_t = 2)]
        max_concurrent: usize,
    },
    /// Validate a dataset document and print the report
    Validate {
        /// Path to a dataset JSON file
        dataset: PathBuf,
    },
    /// Print dataset statistics and split counts
    Info {
        /// Path to a dataset JSON file
        dataset: PathBuf,
    },
}

/// Dispatch a parsed CLI invocation
pub fn run_command(cli: Cli) -> Result<()> {
    let level = if cli.quiet {
        LogLevel::Quiet
    } else if cli.verbose {
        LogLevel::Verbose
    } else {
        LogLevel::Normal
    };

    match cli.command {
        Command::Serve { addr, max_concurrent } => cmd_serve(addr, max_concurrent, level),
        Command::Validate { dataset } => cmd_validate(&dataset, level),
        Command::Info { dataset } => cmd_info(&dataset, level),
    }
}

fn load_dataset(path: &Path) -> Result<DatasetFile> {
    let json = fs::read_to_string(path).map_err(|e| {
        Error::DatasetError(format!("Failed to read dataset file {}: {e}", path.display()))
    })?;
    DatasetFile::from_json(&json)
        .map_err(|e| Error::DatasetError(format!("Failed to parse dataset JSON: {e}")))
}

fn cmd_validate(path: &Path, level: LogLevel) -> Result<()> {
    let dataset = load_dataset(path)?;
    let report = validate(&dataset.classes, &dataset.images, &dataset.annotations);

    for error in &report.errors {
        log(level, LogLevel::Normal, &format!("✗ {error}"));
    }
    for warning in &report.warnings {
        log(level, LogLevel::Normal, &format!("! {warning}"));
    }
    for note in &report.info {
        log(level, LogLevel::Verbose, &format!("  {note}"));
    }

    if report.is_admissible() {
        log(
            level,
            LogLevel::Normal,
            &format!(
                "✓ Dataset admissible: {} images, {} annotations, {} classes",
                dataset.images.len(),
                report.stats.total_annotations,
                dataset.classes.len()
            ),
        );
        Ok(())
    } else {
        Err(Error::ValidationFailed(report.errors.len()))
    }
}

fn cmd_info(path: &Path, level: LogLevel) -> Result<()> {
    let dataset = load_dataset(path)?;
    let report = validate(&dataset.classes, &dataset.images, &dataset.annotations);

    log(level, LogLevel::Normal, &format!("Dataset: {}", path.display()));
    log(level, LogLevel::Normal, &format!("  Classes: {}", dataset.classes.join(", ")));
    log(level, LogLevel::Normal, &format!("  Images: {}", dataset.images.len()));
    log(
        level,
        LogLevel::Normal,
        &format!(
            "  Annotations: {} ({:.2} per image)",
            report.stats.total_annotations, report.stats.avg_annotations_per_image
        ),
    );
    log(
        level,
        LogLevel::Normal,
        &format!(
            "  Annotated/unannotated: {}/{}",
            report.stats.annotated_images, report.stats.unannotated_images
        ),
    );

    for (class, count) in &report.stats.class_distribution {
        log(level, LogLevel::Verbose, &format!("    {class}: {count}"));
    }

    if !dataset.categories.is_empty() {
        let dataset_split = split(&dataset.images, &dataset.annotations, &dataset.categories);
        log(
            level,
            LogLevel::Normal,
            &format!(
                "  Split: train={}, val={}, test={}, unassigned={}",
                dataset_split.train.stats.image_count,
                dataset_split.val.stats.image_count,
                dataset_split.test.stats.image_count,
                dataset_split.unassigned
            ),
        );
    }
    Ok(())
}

#[cfg(feature = "server")]
fn cmd_serve(addr: SocketAddr, max_concurrent: usize, level: LogLevel) -> Result<()> {
    use std::sync::Arc;

    use crate::executor::SimulatedExecutor;
    use crate::scheduler::SchedulerConfig;
    use crate::server::{serve, AppState, ServerConfig};

    let server_config = ServerConfig::default().with_address(addr);
    let scheduler_config = SchedulerConfig::default().with_max_concurrent(max_concurrent);
    let state = AppState::new(server_config, scheduler_config, Arc::new(SimulatedExecutor::new()));

    log(level, LogLevel::Normal, &format!("✓ Scheduler ready ({max_concurrent} slots)"));
    log(level, LogLevel::Normal, &format!("Serving on http://{addr}"));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(state))?;
    Ok(())
}

#[cfg(not(feature = "server"))]
fn cmd_serve(_addr: SocketAddr, _max_concurrent: usize, _level: LogLevel) -> Result<()> {
    Err(Error::ConfigError(
        "this build has no HTTP server; rebuild with the `server` feature".to_string(),
    ))
}
