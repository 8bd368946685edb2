//! Dataset Validator
//!
//! Admission-control checks for a labeled dataset. `validate` is a pure
//! function of its inputs: every rule is evaluated (never short-circuited)
//! so a caller sees all problems at once. Only `errors` block admission;
//! `warnings` and `info` are advisory.
//!
//! # Example
//!
//! ```
//! use adiestrar::validate::validate;
//! use std::collections::HashMap;
//!
//! let report = validate(&[], &[], &HashMap::new());
//! assert!(!report.is_admissible());
//! assert_eq!(report.stats.total_annotations, 0);
//! ```


use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dataset::{AnnotationMap, ImageMeta};

/// Fewer images than this is a blocking error
pub const MIN_IMAGES: usize = 5;
/// Fewer images than this draws a small-dataset warning
pub const SMALL_DATASET_IMAGES: usize = 10;
/// Normalized box area below this is degenerate
const MIN_BOX_AREA: f64 = 1e-4;
/// Normalized box area above this is degenerate
const MAX_BOX_AREA: f64 = 0.5;
/// Imbalance ratio below this is moderate imbalance
const MODERATE_IMBALANCE: f64 = 0.3;
/// Imbalance ratio below this is significant imbalance
const SEVERE_IMBALANCE: f64 = 0.1;
/// Average annotations per image below this is sparse labeling
const MIN_AVG_ANNOTATIONS: f64 = 1.0;
/// Average annotations per image above this is suspicious density
const MAX_AVG_ANNOTATIONS: f64 = 20.0;

/// Quality flags derived from dataset statistics
///
/// Consumed by callers (UI gating); the scheduler itself never reads
/// these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityFlags {
    /// Imbalance ratio is at least the moderate threshold
    pub has_balanced_classes: bool,
    /// At least one annotation per image on average
    pub has_sufficient_annotations: bool,
    /// Image count clears the small-dataset threshold
    pub has_sufficient_images: bool,
    /// Per-image annotation counts are not wildly uneven
    pub uniform_labeling: bool,
}

/// Aggregate dataset statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStats {
    /// Total annotation count across all images
    pub total_annotations: usize,
    /// Per-class annotation counts (every defined class has an entry)
    pub class_distribution: HashMap<String, usize>,
    /// Images with at least one annotation
    pub annotated_images: usize,
    /// Images with no annotations
    pub unannotated_images: usize,
    /// Mean annotations per image
    pub avg_annotations_per_image: f64,
    /// Derived quality flags
    pub quality: QualityFlags,
}

/// Result of dataset validation
///
/// Invariant: `sum(class_distribution) == total_annotations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Blocking problems; non-empty means the submission is rejected
    pub errors: Vec<String>,
    /// Advisory problems; never block admission
    pub warnings: Vec<String>,
    /// Informational notes
    pub info: Vec<String>,
    /// Dataset statistics and quality flags
    pub stats: DatasetStats,
}

impl ValidationReport {
    /// Whether the dataset may become a training job
    #[must_use]
    pub fn is_admissible(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a labeled dataset for training admission
///
/// Evaluates every rule and returns the full report. No side effects.
pub fn validate(
    classes: &[String],
    images: &[ImageMeta],
    annotations: &AnnotationMap,
) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut info = Vec::new();

    // Per-class distribution, seeded with every defined class so that
    // zero-annotation classes are visible.
    let mut class_distribution: HashMap<String, usize> =
        classes.iter().map(|c| (c.clone(), 0)).collect();

    let mut total_annotations = 0usize;
    let mut degenerate_boxes = 0usize;
    let mut per_image_counts = Vec::with_capacity(images.len());

    for image in images {
        let boxes = annotations.get(&image.id).map_or(&[][..], Vec::as_slice);
        per_image_counts.push(boxes.len());
        total_annotations += boxes.len();
        for b in boxes {
            *class_distribution.entry(b.class.clone()).or_insert(0) += 1;
            let area = b.area();
            if area < MIN_BOX_AREA || area > MAX_BOX_AREA {
                degenerate_boxes += 1;
            }
        }
    }

    let annotated_images = per_image_counts.iter().filter(|&&n| n > 0).count();
    let unannotated_images = images.len() - annotated_images;
    let avg_annotations_per_image = if images.is_empty() {
        0.0
    } else {
        total_annotations as f64 / images.len() as f64
    };

    // Blocking errors
    if classes.is_empty() {
        errors.push("No classes defined".to_string());
    }
    if images.len() < MIN_IMAGES {
        errors.push(format!(
            "At least {MIN_IMAGES} images are required, found {}",
            images.len()
        ));
    }
    if total_annotations == 0 {
        errors.push("Dataset has no annotations".to_string());
    }

    // Advisory warnings
    if images.len() >= MIN_IMAGES && images.len() < SMALL_DATASET_IMAGES {
        warnings.push(format!(
            "Small dataset: {} images (recommend at least {SMALL_DATASET_IMAGES})",
            images.len()
        ));
    }
    if unannotated_images > 0 {
        warnings.push(format!(
            "{unannotated_images} image(s) have no annotations and will be excluded from training"
        ));
    }
    if degenerate_boxes > 0 {
        warnings.push(format!(
            "{degenerate_boxes} box(es) have a degenerate normalized area (< {MIN_BOX_AREA} or > {MAX_BOX_AREA})"
        ));
    }

    let imbalance_ratio = imbalance_ratio(&class_distribution);
    if let Some(ratio) = imbalance_ratio {
        if ratio < SEVERE_IMBALANCE {
            warnings.push(format!(
                "Significant class imbalance: min/max annotation ratio is {ratio:.2}"
            ));
        } else if ratio < MODERATE_IMBALANCE {
            warnings.push(format!(
                "Moderate class imbalance: min/max annotation ratio is {ratio:.2}"
            ));
        }
    }

    if total_annotations > 0 && avg_annotations_per_image < MIN_AVG_ANNOTATIONS {
        warnings.push(format!(
            "Low annotation density: {avg_annotations_per_image:.2} annotations per image on average"
        ));
    }
    if avg_annotations_per_image > MAX_AVG_ANNOTATIONS {
        warnings.push(format!(
            "Very high annotation density: {avg_annotations_per_image:.2} annotations per image on average"
        ));
    }

    let empty_classes: Vec<&str> = classes
        .iter()
        .filter(|c| class_distribution.get(*c).copied().unwrap_or(0) == 0)
        .map(String::as_str)
        .collect();
    if !empty_classes.is_empty() {
        warnings.push(format!(
            "{} class(es) have no annotations: {}",
            empty_classes.len(),
            empty_classes.join(", ")
        ));
    }

    // Informational: uneven labeling effort
    let uniform_labeling = is_uniform(&per_image_counts);
    if !uniform_labeling {
        info.push(
            "Annotation counts vary widely between images (uneven labeling effort)".to_string(),
        );
    }

    let quality = QualityFlags {
        has_balanced_classes: imbalance_ratio.map_or(true, |r| r >= MODERATE_IMBALANCE),
        has_sufficient_annotations: avg_annotations_per_image >= MIN_AVG_ANNOTATIONS,
        has_sufficient_images: images.len() >= SMALL_DATASET_IMAGES,
        uniform_labeling,
    };

    ValidationReport {
        errors,
        warnings,
        info,
        stats: DatasetStats {
            total_annotations,
            class_distribution,
            annotated_images,
            unannotated_images,
            avg_annotations_per_image,
            quality,
        },
    }
}

/// min-nonzero / max-nonzero over per-class counts
///
/// `None` when fewer than two classes have annotations (ratio undefined).
fn imbalance_ratio(distribution: &HashMap<String, usize>) -> Option<f64> {
    let nonzero: Vec<usize> = distribution.values().copied().filter(|&n| n > 0).collect();
    if nonzero.len() < 2 {
        return None;
    }
    let min = *nonzero.iter().min()?;
    let max = *nonzero.iter().max()?;
    Some(min as f64 / max as f64)
}

/// Whether the std deviation of per-image counts stays within half the mean
fn is_uniform(per_image_counts: &[usize]) -> bool {
    if per_image_counts.is_empty() {
        return true;
    }
    let n = per_image_counts.len() as f64;
    let mean = per_image_counts.iter().sum::<usize>() as f64 / n;
    if mean == 0.0 {
        return true;
    }
    let variance = per_image_counts
        .iter()
        .map(|&c| {
            let d = c as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    variance.sqrt() <= mean / 2.0
}
