//! Dataset data model
//!
//! Shared types for labeled object-detection datasets: image metadata,
//! normalized bounding boxes, per-image split categories, and the
//! hyperparameter config handed to the training executor.
//!
//! Box coordinates are normalized to [0,1] relative to the image, so a
//! box's `area()` is directly the fraction of the image it covers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Annotations keyed by image id
pub type AnnotationMap = HashMap<String, Vec<BoundingBox>>;

/// Metadata for a single dataset image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMeta {
    /// Unique image id
    pub id: String,
    /// Original file name
    pub file_name: String,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
}

impl ImageMeta {
    /// Create image metadata
    pub fn new(id: &str, file_name: &str, width: u32, height: u32) -> Self {
        Self { id: id.to_string(), file_name: file_name.to_string(), width, height }
    }
}

/// A labeled bounding box in normalized coordinates
///
/// `x`/`y` are the top-left corner; `width`/`height` are the box extent.
/// All four are fractions of the image dimensions in [0,1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Class name this box is labeled with
    pub class: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Create a box for the given class
    pub fn new(class: &str, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { class: class.to_string(), x, y, width, height }
    }

    /// Fraction of the image area this box covers
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Explicit per-image partition assignment
///
/// Assigned by the operator in the annotation UI. An image with no
/// assignment is excluded from every partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitCategory {
    /// Used for gradient updates
    Train,
    /// Used for per-epoch evaluation
    Val,
    /// Held out for final evaluation
    Test,
}

impl SplitCategory {
    /// Display name for the category
    pub fn as_str(self) -> &'static str {
        match self {
            SplitCategory::Train => "train",
            SplitCategory::Val => "val",
            SplitCategory::Test => "test",
        }
    }
}

impl std::fmt::Display for SplitCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Training hyperparameters
///
/// Opaque to the scheduler: only the executor interprets these. `epochs`
/// is also read when reporting progress (total epoch count on the job).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Model variant to train (e.g. "yolov8n")
    pub model_variant: String,
    /// Number of training epochs
    pub epochs: u32,
    /// Mini-batch size
    pub batch_size: usize,
    /// Optimizer learning rate
    pub learning_rate: f64,
    /// Square input resolution in pixels
    pub image_size: u32,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model_variant: "yolov8n".to_string(),
            epochs: 50,
            batch_size: 16,
            learning_rate: 0.001,
            image_size: 640,
        }
    }
}

impl TrainConfig {
    /// Set the model variant
    pub fn with_model_variant(mut self, variant: &str) -> Self {
        self.model_variant = variant.to_string();
        self
    }

    /// Set the epoch count
    pub fn with_epochs(mut self, epochs: u32) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set the batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set the input resolution
    pub fn with_image_size(mut self, size: u32) -> Self {
        self.image_size = size;
        self
    }
}

/// Dataset summary attached to a training job
///
/// Produced by the validator/splitter at admission time; read-only
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInfo {
    /// Defined class names
    pub classes: Vec<String>,
    /// Total images submitted
    pub image_count: usize,
    /// Total annotations across all images
    pub annotation_count: usize,
    /// Images assigned to the train partition
    pub train_images: usize,
    /// Images assigned to the val partition
    pub val_images: usize,
    /// Images assigned to the test partition
    pub test_images: usize,
}

/// On-disk dataset document
///
/// JSON interchange format consumed by the CLI `validate`/`info` commands
/// and produced by the annotation front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetFile {
    pub classes: Vec<String>,
    pub images: Vec<ImageMeta>,
    pub annotations: AnnotationMap,
    /// Per-image split assignment; images absent from the map are unset
    #[serde(default)]
    pub categories: HashMap<String, SplitCategory>,
}

impl DatasetFile {
    /// Parse a dataset document from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
