//! Training Executor interface
//!
//! The external-collaborator seam: given a split dataset and
//! hyperparameters, an executor performs the actual training, emitting
//! [`ProgressEvent`]s along the way and terminating in a
//! [`TrainingOutcome`] or an error. The scheduler forwards progress into
//! the job record and treats metrics as an opaque payload, so swapping in
//! a real trainer requires no scheduler changes.
//!
//! [`SimulatedExecutor`] is the reference implementation: timer-driven
//! epochs with synthetic decaying loss curves. All randomness and metric
//! fabrication lives there.

mod simulate;

pub use simulate::SimulatedExecutor;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::TrainConfig;
use crate::split::DatasetSplit;

/// Errors raised by a training executor
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Training failed: {0}")]
    Training(String),

    #[error("Dataset unusable: {0}")]
    Dataset(String),
}

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, ExecutorError>;

/// Progress report emitted during training
///
/// `progress` stays in [0,100); the scheduler sets 100 on completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Current epoch (1-indexed)
    pub epoch: u32,
    /// Total epochs configured
    pub total_epochs: u32,
    /// Human-readable log line
    pub message: String,
    /// Updated progress percentage
    pub progress: u8,
}

/// Metadata describing the produced model artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Artifact file name
    pub name: String,
    /// Serialization format (e.g. "safetensors")
    pub format: String,
    /// Size in bytes
    pub size_bytes: u64,
    /// Content checksum
    pub checksum: String,
}

/// Terminal result of a successful training run
///
/// Metrics are opaque to the scheduler; only the executor (or a
/// downstream consumer) interprets them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingOutcome {
    /// Final metric bundle (name -> value)
    pub metrics: HashMap<String, f64>,
    /// Produced artifact metadata
    pub artifact: ArtifactMetadata,
}

/// The training collaborator consumed by the scheduler
///
/// `run` must emit a finite sequence of progress events and return.
/// Implementations are invoked on a scheduler worker thread, one job per
/// thread, so they may block for the duration of training.
pub trait TrainingExecutor: Send + Sync {
    /// Train on the given split, reporting progress through the callback
    fn run(
        &self,
        split: &DatasetSplit,
        config: &TrainConfig,
        on_progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<TrainingOutcome>;
}
