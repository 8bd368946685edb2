//! Adiestrar CLI
//!
//! Entry point for the training-core service and dataset tooling.
//!
//! # Usage
//!
//! ```bash
//! # Start the training API server
//! adiestrar serve --addr 127.0.0.1:5000 --max-concurrent 2
//!
//! # Validate a dataset document
//! adiestrar validate dataset.json
//!
//! # Show dataset statistics and split counts
//! adiestrar info dataset.json
//! ```

use adiestrar::cli::{run_command, Cli};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
