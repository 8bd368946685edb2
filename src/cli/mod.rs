//! CLI module
//!
//! Command handlers and output utilities for the `adiestrar` binary.

mod commands;
mod logging;

pub use commands::{run_command, Cli, Command};
pub use logging::LogLevel;
