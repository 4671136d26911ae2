//! Train/val/test partition assignment.
//!
//! The split is one-shot: only the images passed in are shuffled and
//! divided, so repeated runs over disjoint batches of new images grow each
//! partition monotonically and never move an image that was assigned
//! earlier.

mod report;

pub use report::{PartitionCounts, SplitReport};

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::CurateError;
use crate::layout::{
    collect_image_stems, collect_images, file_stem, label_path_for, Partition, PartitionDirs,
};

/// Tolerance applied when checking that ratios sum to at most 1.
const RATIO_EPSILON: f64 = 1e-9;

/// Fractions of a batch assigned to each partition.
///
/// The train and val shares are `floor(N * ratio)`; the test partition takes
/// whatever remains, so `test` only participates in validation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitRatios {
    pub train: f64,
    pub val: f64,
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.7,
            val: 0.2,
            test: 0.1,
        }
    }
}

impl SplitRatios {
    /// Validate and build ratios. Each must lie in `[0, 1]` and their sum
    /// must not exceed 1.
    pub fn new(train: f64, val: f64, test: f64) -> Result<Self, CurateError> {
        for (name, value) in [("train", train), ("val", val), ("test", test)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CurateError::InvalidSplitRatios {
                    message: format!("{name} ratio {value} is outside [0, 1]"),
                });
            }
        }

        let sum = train + val + test;
        if sum > 1.0 + RATIO_EPSILON {
            return Err(CurateError::InvalidSplitRatios {
                message: format!("ratios sum to {sum}, which exceeds 1"),
            });
        }

        Ok(Self { train, val, test })
    }
}

/// A shuffled three-way division of a batch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SplitPlan<T> {
    pub train: Vec<T>,
    pub val: Vec<T>,
    pub test: Vec<T>,
}

impl<T> SplitPlan<T> {
    pub fn get(&self, partition: Partition) -> &[T] {
        match partition {
            Partition::Train => &self.train,
            Partition::Val => &self.val,
            Partition::Test => &self.test,
        }
    }
}

/// Shuffle `items` and divide them by `ratios`.
///
/// The first `floor(N * train)` go to train, the next `floor(N * val)` to
/// val, and the remainder to test.
pub fn split_items<T, R: Rng + ?Sized>(
    mut items: Vec<T>,
    ratios: &SplitRatios,
    rng: &mut R,
) -> SplitPlan<T> {
    items.shuffle(rng);

    let total = items.len();
    let train_len = ((total as f64 * ratios.train).floor() as usize).min(total);
    let val_len = ((total as f64 * ratios.val).floor() as usize).min(total - train_len);

    let test = items.split_off(train_len + val_len);
    let val = items.split_off(train_len);

    SplitPlan {
        train: items,
        val,
        test,
    }
}

/// What happened to a single image during materialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    CopiedWithoutAnnotation,
    AlreadyPresent,
}

/// Copy one image and its annotation into a partition.
pub fn copy_pair(
    image: &Path,
    labels_dir: &Path,
    dest: &PartitionDirs,
) -> Result<CopyOutcome, CurateError> {
    let (Some(file_name), Some(stem)) = (image.file_name(), file_stem(image)) else {
        return Err(CurateError::LayoutInvalid {
            path: image.to_path_buf(),
            message: "image file name is not valid UTF-8".to_string(),
        });
    };

    let target_image = dest.images.join(file_name);
    let target_label = dest.label_path(&stem);
    if target_image.exists() && target_label.exists() {
        return Ok(CopyOutcome::AlreadyPresent);
    }

    fs::copy(image, &target_image)?;

    let source_label = label_path_for(labels_dir, &stem);
    if source_label.is_file() {
        fs::copy(&source_label, &target_label)?;
        Ok(CopyOutcome::Copied)
    } else {
        Ok(CopyOutcome::CopiedWithoutAnnotation)
    }
}

/// Split `images` into partitions under `output_root` and copy each
/// image/annotation pair into its partition.
///
/// Images whose stem already appears in a partition stay there: they are
/// routed back to that partition and only the remaining images are
/// shuffled and divided. Per-image copy failures are logged and counted.
/// Only failure to create a partition directory is returned as an error.
pub fn assign_partitions<R: Rng + ?Sized>(
    images: &[PathBuf],
    labels_dir: &Path,
    output_root: &Path,
    ratios: &SplitRatios,
    rng: &mut R,
    seed: u64,
) -> Result<SplitReport, CurateError> {
    let mut report = SplitReport::new(seed);
    if images.is_empty() {
        info!("No new images to split");
        return Ok(report);
    }

    let mut existing = BTreeMap::new();
    for partition in Partition::ALL {
        let dirs = PartitionDirs::for_partition(output_root, partition);
        for stem in collect_image_stems(&dirs.images)? {
            existing.entry(stem).or_insert(partition);
        }
    }

    let mut placed: BTreeMap<Partition, Vec<PathBuf>> = BTreeMap::new();
    let mut fresh = Vec::new();
    for image in images {
        match file_stem(image).and_then(|stem| existing.get(&stem).copied()) {
            Some(partition) => placed.entry(partition).or_default().push(image.clone()),
            None => fresh.push(image.clone()),
        }
    }

    let plan = split_items(fresh, ratios, rng);

    for partition in Partition::ALL {
        let dirs = PartitionDirs::for_partition(output_root, partition);
        dirs.ensure()?;

        let files: Vec<&PathBuf> = plan
            .get(partition)
            .iter()
            .chain(placed.get(&partition).into_iter().flatten())
            .collect();
        let counts = report.get_mut(partition);
        counts.assigned = files.len();

        for image in &files {
            match copy_pair(image, labels_dir, &dirs) {
                Ok(CopyOutcome::Copied) => counts.copied += 1,
                Ok(CopyOutcome::CopiedWithoutAnnotation) => {
                    warn!(
                        "No annotation file for {}; copied image without one",
                        image.display()
                    );
                    counts.copied += 1;
                    counts.missing_annotation += 1;
                }
                Ok(CopyOutcome::AlreadyPresent) => {
                    info!(
                        "Skipping {} (already in {})",
                        image.display(),
                        partition
                    );
                    counts.already_present += 1;
                }
                Err(err) => {
                    error!("Failed to copy {} into {}: {err}", image.display(), partition);
                    counts.failed += 1;
                }
            }
        }

        info!("{}: {} image(s)", partition, files.len());
    }

    Ok(report)
}

/// Labeled images in `images_dir` that do not yet appear, by stem, in any
/// partition under `output_root`.
///
/// An image counts as labeled when its annotation file exists in
/// `labels_dir`, even if that file is empty.
pub fn unassigned_labeled_images(
    images_dir: &Path,
    labels_dir: &Path,
    output_root: &Path,
) -> Result<Vec<PathBuf>, CurateError> {
    let mut assigned = BTreeSet::new();
    for partition in Partition::ALL {
        let dirs = PartitionDirs::for_partition(output_root, partition);
        assigned.extend(collect_image_stems(&dirs.images)?);
    }

    Ok(collect_images(images_dir)?
        .into_iter()
        .filter(|image| match file_stem(image) {
            Some(stem) => {
                !assigned.contains(&stem) && label_path_for(labels_dir, &stem).is_file()
            }
            None => false,
        })
        .collect())
}
