//! Simulated training executor
//!
//! Reference implementation of [`TrainingExecutor`]: an epoch loop with a
//! configurable pause producing synthetic exponential-decay loss curves
//! and plausible detection metrics. Useful for demos and for exercising
//! the scheduler without a GPU.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use rand::Rng;

use super::{ArtifactMetadata, ProgressEvent, Result, TrainingExecutor, TrainingOutcome};
use crate::dataset::TrainConfig;
use crate::split::DatasetSplit;

/// Timer-driven fake trainer
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    /// Pause per simulated epoch
    epoch_pause: Duration,
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self { epoch_pause: Duration::from_millis(200) }
    }
}

impl SimulatedExecutor {
    /// Create a simulated executor with the default epoch pause
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-epoch pause in milliseconds
    ///
    /// Zero makes runs effectively instantaneous (handy in tests).
    #[must_use]
    pub fn with_epoch_pause_ms(mut self, ms: u64) -> Self {
        self.epoch_pause = Duration::from_millis(ms);
        self
    }
}

impl TrainingExecutor for SimulatedExecutor {
    fn run(
        &self,
        split: &DatasetSplit,
        config: &TrainConfig,
        on_progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<TrainingOutcome> {
        let mut rng = rand::thread_rng();
        let total_epochs = config.epochs.max(1);
        let mut loss = 0.0;

        for epoch in 1..=total_epochs {
            if !self.epoch_pause.is_zero() {
                thread::sleep(self.epoch_pause);
            }

            // Exponential decay toward a small floor, with jitter
            let decay = (-0.08 * f64::from(epoch)).exp();
            loss = 0.05 + 1.2 * decay + rng.gen_range(-0.02..0.02);
            let val_loss = loss + rng.gen_range(0.0..0.05);

            // Stays below 100 until the scheduler marks completion
            let progress = ((u64::from(epoch) * 100 / u64::from(total_epochs)) as u8).min(99);
            on_progress(ProgressEvent {
                epoch,
                total_epochs,
                message: format!("Epoch {epoch}/{total_epochs}: loss={loss:.4}, val_loss={val_loss:.4}"),
                progress,
            });
        }

        let mut metrics = HashMap::new();
        metrics.insert("final_loss".to_string(), loss);
        metrics.insert("precision".to_string(), rng.gen_range(0.72..0.93));
        metrics.insert("recall".to_string(), rng.gen_range(0.65..0.90));
        metrics.insert("map50".to_string(), rng.gen_range(0.60..0.88));

        // Artifact size scales loosely with the training set
        let size_bytes = 4_000_000 + (split.train.stats.annotation_count as u64) * 1024;
        Ok(TrainingOutcome {
            metrics,
            artifact: ArtifactMetadata {
                name: format!("{}-best.safetensors", config.model_variant),
                format: "safetensors".to_string(),
                size_bytes,
                checksum: format!("sha256-{:016x}", rng.gen::<u64>()),
            },
        })
    }
}
