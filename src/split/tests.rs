//! Tests for the split module

use std::collections::HashMap;

use super::split;
use crate::dataset::{AnnotationMap, BoundingBox, ImageMeta, SplitCategory};

fn make_images(n: usize) -> Vec<ImageMeta> {
    (0..n)
        .map(|i| ImageMeta::new(&format!("img-{i}"), &format!("img-{i}.jpg"), 640, 480))
        .collect()
}

fn annotate_all(images: &[ImageMeta]) -> AnnotationMap {
    images
        .iter()
        .map(|img| (img.id.clone(), vec![BoundingBox::new("cat", 0.3, 0.3, 0.2, 0.2)]))
        .collect()
}

/// Assign the first `train` images to train, the next `val` to val, the
/// next `test` to test; the remainder stays unset.
fn assign(
    images: &[ImageMeta],
    train: usize,
    val: usize,
    test: usize,
) -> HashMap<String, SplitCategory> {
    let mut categories = HashMap::new();
    for (i, img) in images.iter().enumerate() {
        let category = if i < train {
            SplitCategory::Train
        } else if i < train + val {
            SplitCategory::Val
        } else if i < train + val + test {
            SplitCategory::Test
        } else {
            continue;
        };
        categories.insert(img.id.clone(), category);
    }
    categories
}

#[test]
fn test_split_partitions_by_category() {
    let images = make_images(10);
    let annotations = annotate_all(&images);
    let categories = assign(&images, 6, 2, 2);

    let result = split(&images, &annotations, &categories);
    assert_eq!(result.train.stats.image_count, 6);
    assert_eq!(result.val.stats.image_count, 2);
    assert_eq!(result.test.stats.image_count, 2);
    assert_eq!(result.unassigned, 0);
}

#[test]
fn test_split_excludes_unset_images() {
    let images = make_images(10);
    let annotations = annotate_all(&images);
    let categories = assign(&images, 6, 2, 0);

    let result = split(&images, &annotations, &categories);
    assert_eq!(result.train.stats.image_count, 6);
    assert_eq!(result.val.stats.image_count, 2);
    assert_eq!(result.test.stats.image_count, 0);
    assert_eq!(result.unassigned, 2);
}

#[test]
fn test_split_partitions_are_disjoint() {
    let images = make_images(12);
    let annotations = annotate_all(&images);
    let categories = assign(&images, 8, 2, 2);

    let result = split(&images, &annotations, &categories);
    let mut seen = std::collections::HashSet::new();
    for partition in [&result.train, &result.val, &result.test] {
        for img in &partition.images {
            assert!(seen.insert(img.id.clone()), "image {} in two partitions", img.id);
        }
    }
    assert_eq!(seen.len(), 12);
}

#[test]
fn test_split_filters_annotations_to_partition() {
    let images = make_images(10);
    let annotations = annotate_all(&images);
    let categories = assign(&images, 6, 2, 2);

    let result = split(&images, &annotations, &categories);
    assert_eq!(result.train.annotations.len(), 6);
    assert!(result.train.annotations.contains_key("img-0"));
    assert!(!result.train.annotations.contains_key("img-6"));
    assert_eq!(result.val.annotations.len(), 2);
}

#[test]
fn test_split_stats_average() {
    let images = make_images(6);
    let mut annotations = annotate_all(&images);
    // img-0 gets two extra boxes
    annotations
        .get_mut("img-0")
        .unwrap()
        .extend([BoundingBox::new("cat", 0.1, 0.1, 0.2, 0.2), BoundingBox::new("cat", 0.5, 0.5, 0.2, 0.2)]);
    let categories = assign(&images, 4, 2, 0);

    let result = split(&images, &annotations, &categories);
    assert_eq!(result.train.stats.annotation_count, 6);
    assert!((result.train.stats.avg_annotations_per_image - 1.5).abs() < f64::EPSILON);
}

#[test]
fn test_split_unannotated_image_in_partition() {
    let images = make_images(6);
    let mut annotations = annotate_all(&images);
    annotations.remove("img-0");
    let categories = assign(&images, 4, 2, 0);

    let result = split(&images, &annotations, &categories);
    assert_eq!(result.train.stats.image_count, 4);
    assert_eq!(result.train.annotations.len(), 3);
    assert_eq!(result.train.stats.annotation_count, 3);
}

#[test]
fn test_split_is_deterministic() {
    let images = make_images(10);
    let annotations = annotate_all(&images);
    let categories = assign(&images, 6, 2, 2);

    let a = split(&images, &annotations, &categories);
    let b = split(&images, &annotations, &categories);
    let ids = |p: &super::SplitPartition| p.images.iter().map(|i| i.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&a.train), ids(&b.train));
    assert_eq!(ids(&a.val), ids(&b.val));
    assert_eq!(ids(&a.test), ids(&b.test));
}

// ---------------------------------------------------------------------------
// Admissibility
// ---------------------------------------------------------------------------

#[test]
fn test_admissibility_accepts_train_and_val() {
    let images = make_images(10);
    let annotations = annotate_all(&images);
    let categories = assign(&images, 6, 2, 0);

    let result = split(&images, &annotations, &categories);
    assert!(result.admissibility().is_ok());
}

#[test]
fn test_admissibility_rejects_empty_val() {
    let images = make_images(10);
    let annotations = annotate_all(&images);
    let categories = assign(&images, 10, 0, 0);

    let result = split(&images, &annotations, &categories);
    let rejection = result.admissibility().unwrap_err();
    assert_eq!(rejection.train, 10);
    assert_eq!(rejection.val, 0);
    assert_eq!(rejection.unassigned, 0);
}

#[test]
fn test_admissibility_rejects_empty_train() {
    let images = make_images(5);
    let annotations = annotate_all(&images);
    let categories = assign(&images, 0, 5, 0);

    let result = split(&images, &annotations, &categories);
    assert!(result.admissibility().is_err());
}

#[test]
fn test_rejection_message_reports_counts() {
    let images = make_images(10);
    let annotations = annotate_all(&images);
    let categories = assign(&images, 7, 0, 1);

    let result = split(&images, &annotations, &categories);
    let message = result.admissibility().unwrap_err().to_string();
    assert!(message.contains("train=7"));
    assert!(message.contains("val=0"));
    assert!(message.contains("test=1"));
    assert!(message.contains("unassigned=2"));
}

// ---------------------------------------------------------------------------
// DatasetInfo
// ---------------------------------------------------------------------------

#[test]
fn test_info_counts() {
    let images = make_images(10);
    let annotations = annotate_all(&images);
    let categories = assign(&images, 6, 2, 1);

    let result = split(&images, &annotations, &categories);
    let info = result.info(&[String::from("cat")]);
    assert_eq!(info.image_count, 10);
    assert_eq!(info.train_images, 6);
    assert_eq!(info.val_images, 2);
    assert_eq!(info.test_images, 1);
    // Annotation count covers only categorized images
    assert_eq!(info.annotation_count, 9);
    assert_eq!(info.classes, vec!["cat"]);
}
