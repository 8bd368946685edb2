//! Top-level error type
//!
//! Folds module-level errors together for CLI entry points. Library code
//! keeps the per-module error enums; this type exists so `main` has a
//! single error surface to print.

use thiserror::Error;

/// Crate-level error
#[derive(Debug, Error)]
pub enum Error {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Dataset error: {0}")]
    DatasetError(String),

    #[error("Dataset rejected: {0} blocking error(s)")]
    ValidationFailed(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Submission error: {0}")]
    Submit(#[from] crate::scheduler::SubmitError),

    #[error("Server error: {0}")]
    Server(#[from] crate::server::ServerError),
}

/// Result type for crate-level operations
pub type Result<T> = std::result::Result<T, Error>;
