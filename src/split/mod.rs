//! Dataset Splitter
//!
//! Deterministic train/val/test partitioning driven entirely by explicit
//! per-image category assignments. There is no shuffling or randomness:
//! the same inputs always produce the same split, and the operator can
//! audit the partition before committing to training.
//!
//! Images with no category assignment are excluded from every partition
//! and reported through `DatasetSplit::unassigned`.

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::{AnnotationMap, DatasetInfo, ImageMeta, SplitCategory};

/// Statistics for one partition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionStats {
    pub image_count: usize,
    pub annotation_count: usize,
    pub avg_annotations_per_image: f64,
}

/// One partition of the dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitPartition {
    /// Images assigned to this partition
    pub images: Vec<ImageMeta>,
    /// Annotation map filtered to this partition's images
    pub annotations: AnnotationMap,
    /// Partition statistics
    pub stats: PartitionStats,
}

impl SplitPartition {
    fn new(images: Vec<ImageMeta>, annotations: AnnotationMap) -> Self {
        let annotation_count = annotations.values().map(Vec::len).sum();
        let avg = if images.is_empty() {
            0.0
        } else {
            annotation_count as f64 / images.len() as f64
        };
        let stats = PartitionStats {
            image_count: images.len(),
            annotation_count,
            avg_annotations_per_image: avg,
        };
        Self { images, annotations, stats }
    }
}

/// Rejection raised when the split cannot support training
///
/// Carries the current counts so the operator can fix categorization.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error(
    "unusable split: train and val each need at least one image \
     (train={train}, val={val}, test={test}, unassigned={unassigned})"
)]
pub struct SplitRejection {
    pub train: usize,
    pub val: usize,
    pub test: usize,
    pub unassigned: usize,
}

/// A dataset partitioned into train/val/test groups
///
/// Partitions are disjoint; their image union is the subset of submitted
/// images that carry a category assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSplit {
    pub train: SplitPartition,
    pub val: SplitPartition,
    pub test: SplitPartition,
    /// Submitted images with no category assignment
    pub unassigned: usize,
}

impl DatasetSplit {
    /// Admission rule: training needs at least one train and one val image
    pub fn admissibility(&self) -> Result<(), SplitRejection> {
        if self.train.stats.image_count == 0 || self.val.stats.image_count == 0 {
            return Err(SplitRejection {
                train: self.train.stats.image_count,
                val: self.val.stats.image_count,
                test: self.test.stats.image_count,
                unassigned: self.unassigned,
            });
        }
        Ok(())
    }

    /// Build the job-facing dataset summary
    #[must_use]
    pub fn info(&self, classes: &[String]) -> DatasetInfo {
        let image_count = self.train.stats.image_count
            + self.val.stats.image_count
            + self.test.stats.image_count
            + self.unassigned;
        DatasetInfo {
            classes: classes.to_vec(),
            image_count,
            annotation_count: self.train.stats.annotation_count
                + self.val.stats.annotation_count
                + self.test.stats.annotation_count,
            train_images: self.train.stats.image_count,
            val_images: self.val.stats.image_count,
            test_images: self.test.stats.image_count,
        }
    }
}

/// Partition a dataset by explicit per-image categories
///
/// Images absent from `categories` are excluded from all partitions and
/// counted as unassigned. Annotation maps are filtered per partition.
pub fn split(
    images: &[ImageMeta],
    annotations: &AnnotationMap,
    categories: &HashMap<String, SplitCategory>,
) -> DatasetSplit {
    let mut train_images = Vec::new();
    let mut val_images = Vec::new();
    let mut test_images = Vec::new();
    let mut unassigned = 0usize;

    for image in images {
        match categories.get(&image.id) {
            Some(SplitCategory::Train) => train_images.push(image.clone()),
            Some(SplitCategory::Val) => val_images.push(image.clone()),
            Some(SplitCategory::Test) => test_images.push(image.clone()),
            None => unassigned += 1,
        }
    }

    let filter = |subset: &[ImageMeta]| -> AnnotationMap {
        subset
            .iter()
            .filter_map(|img| {
                annotations.get(&img.id).map(|boxes| (img.id.clone(), boxes.clone()))
            })
            .collect()
    };

    let train_annotations = filter(&train_images);
    let val_annotations = filter(&val_images);
    let test_annotations = filter(&test_images);

    DatasetSplit {
        train: SplitPartition::new(train_images, train_annotations),
        val: SplitPartition::new(val_images, val_annotations),
        test: SplitPartition::new(test_images, test_annotations),
        unassigned,
    }
}
