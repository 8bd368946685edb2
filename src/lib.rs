//! # adiestrar
//!
//! Training-job admission, validation, and scheduling for object-detection
//! datasets.
//!
//! A labeled dataset (classes, images, bounding boxes) is checked by the
//! [`validate`] module, partitioned by the [`split`] module from explicit
//! per-image category assignments, and admitted to the [`scheduler`], which
//! runs jobs under a bounded-concurrency FIFO queue and records finished
//! models in the [`registry`]. Actual model training happens behind the
//! [`executor::TrainingExecutor`] trait; this crate ships a simulated
//! reference implementation and treats metrics as an opaque payload so a
//! real trainer can be swapped in without scheduler changes.
//!
//! # Example
//!
//! ```
//! use adiestrar::dataset::{BoundingBox, ImageMeta, SplitCategory, TrainConfig};
//! use adiestrar::executor::SimulatedExecutor;
//! use adiestrar::registry::ModelRegistry;
//! use adiestrar::scheduler::{SchedulerConfig, SubmitRequest, TrainingScheduler};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ModelRegistry::in_memory());
//! let executor = Arc::new(SimulatedExecutor::new().with_epoch_pause_ms(0));
//! let scheduler = TrainingScheduler::new(SchedulerConfig::default(), executor, registry);
//!
//! let classes = vec!["cat".to_string(), "dog".to_string()];
//! let mut images = Vec::new();
//! let mut annotations = HashMap::new();
//! let mut categories = HashMap::new();
//! for i in 0..10 {
//!     let id = format!("img-{i}");
//!     images.push(ImageMeta::new(&id, &format!("{id}.jpg"), 640, 480));
//!     annotations.insert(id.clone(), vec![BoundingBox::new("cat", 0.4, 0.4, 0.2, 0.2)]);
//!     let category = if i < 8 { SplitCategory::Train } else { SplitCategory::Val };
//!     categories.insert(id, category);
//! }
//!
//! let receipt = scheduler
//!     .submit(SubmitRequest {
//!         classes,
//!         images,
//!         annotations,
//!         config: TrainConfig::default().with_epochs(2),
//!         categories,
//!     })
//!     .expect("admissible dataset");
//! assert!(scheduler.status(&receipt.job.id).is_some());
//! ```

pub mod cli;
pub mod dataset;
pub mod error;
pub mod executor;
pub mod registry;
pub mod scheduler;
pub mod server;
pub mod split;
pub mod validate;

pub use error::{Error, Result};
