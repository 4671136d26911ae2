//! Augmentation of the train partition.
//!
//! Every train image not yet present in the processed tree is copied there
//! together with its repaired annotation file. Images that keep at least one
//! valid box also get a synthetic `<stem>_aug` pair produced by an
//! [`Augment`] implementation. The `_aug` stems double as the idempotency
//! marker: an input stem is skipped when either form already exists in the
//! output.
//!
//! Val and test are never augmented; [`mirror_partition`] copies them over
//! unchanged.

mod config;
mod report;
pub mod transform;

pub use config::{
    AugmentConfig, BrightnessContrastConfig, DropoutConfig, FlipConfig, HsvConfig,
    MotionBlurConfig, NoiseConfig, RotateConfig,
};
pub use report::{AugmentReport, MirrorCounts};
pub use transform::{Sample, Transform};

use std::fs;
use std::path::Path;

use log::{debug, error, info, warn};
use rand::{rngs::StdRng, RngExt, SeedableRng};

use crate::annotation::{
    absolute_to_normalized, clip_boxes, normalized_to_absolute, read_annotation_file,
    repair_records, write_annotation_file, YoloRecord,
};
use crate::error::CurateError;
use crate::layout::{
    augmented_stem, collect_image_stems, collect_images, file_stem, is_augmented_stem,
    label_path_for, Partition, PartitionDirs,
};
use crate::split::{copy_pair, CopyOutcome};
use transform::{
    BrightnessContrast, CoarseDropout, GaussianNoise, HorizontalFlip, HueSaturationValue,
    MotionBlur, Rotate,
};

/// A randomized image + boxes transform.
pub trait Augment {
    fn augment(&self, sample: Sample, rng: &mut StdRng) -> Sample;
}

/// The fixed-order augmentation pipeline: flip, rotate, brightness and
/// contrast, HSV, noise, motion blur, dropout.
pub struct AugmentPipeline {
    steps: Vec<Box<dyn Transform>>,
}

impl AugmentPipeline {
    pub fn new(config: &AugmentConfig) -> Self {
        let steps: Vec<Box<dyn Transform>> = vec![
            Box::new(HorizontalFlip(config.flip.clone())),
            Box::new(Rotate(config.rotate.clone())),
            Box::new(BrightnessContrast(config.brightness_contrast.clone())),
            Box::new(HueSaturationValue(config.hsv.clone())),
            Box::new(GaussianNoise(config.noise.clone())),
            Box::new(MotionBlur(config.motion_blur.clone())),
            Box::new(CoarseDropout(config.dropout.clone())),
        ];
        Self { steps }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }
}

impl Default for AugmentPipeline {
    fn default() -> Self {
        Self::new(&AugmentConfig::default())
    }
}

impl Augment for AugmentPipeline {
    fn augment(&self, mut sample: Sample, rng: &mut StdRng) -> Sample {
        for step in &self.steps {
            if rng.random::<f64>() < step.probability() {
                debug!("applying {}", step.name());
                sample = step.apply(sample, rng);
            }
        }
        sample
    }
}

/// What happened to a single train image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AugmentOutcome {
    /// Original copied and an `_aug` pair written.
    Augmented { objects: usize },
    /// Original copied; it has no valid annotation.
    OriginalOnly,
    /// Original copied; every box was lost during the transform.
    BoxesLost,
}

/// Copy one image with its repaired annotations into `output` and, if it
/// has any valid box, write its augmented derivative.
pub fn augment_image<A: Augment + ?Sized>(
    augmenter: &A,
    image_path: &Path,
    input_labels: &Path,
    output: &PartitionDirs,
    rng: &mut StdRng,
) -> Result<AugmentOutcome, CurateError> {
    let unreadable = |message: String| CurateError::UnreadableImage {
        path: image_path.to_path_buf(),
        message,
    };
    let (Some(file_name), Some(stem)) = (image_path.file_name(), file_stem(image_path)) else {
        return Err(unreadable("file name is not valid UTF-8".to_string()));
    };

    let decoded = image::open(image_path)
        .map_err(|err| unreadable(err.to_string()))?
        .to_rgb8();
    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(unreadable(format!("invalid dimensions {width}x{height}")));
    }

    let records = repair_records(&read_annotation_file(&label_path_for(input_labels, &stem))?);

    fs::copy(image_path, output.images.join(file_name))?;
    write_annotation_file(&output.label_path(&stem), &records)?;

    if records.is_empty() {
        return Ok(AugmentOutcome::OriginalOnly);
    }

    let boxes: Vec<_> = records
        .iter()
        .map(|record| normalized_to_absolute(record, width, height))
        .collect();
    let boxes = clip_boxes(&boxes, width, height);
    if boxes.is_empty() {
        return Ok(AugmentOutcome::BoxesLost);
    }

    let sample = augmenter.augment(Sample::new(decoded, boxes), rng);
    let (out_width, out_height) = sample.image.dimensions();
    let normalized: Vec<YoloRecord> = clip_boxes(&sample.boxes, out_width, out_height)
        .iter()
        .map(|b| absolute_to_normalized(b, out_width, out_height))
        .collect();
    let aug_records = repair_records(&normalized);
    if aug_records.is_empty() {
        return Ok(AugmentOutcome::BoxesLost);
    }

    let aug_stem = augmented_stem(&stem);
    let aug_image_path = match image_path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => output.images.join(format!("{aug_stem}.{ext}")),
        None => output.images.join(&aug_stem),
    };
    sample
        .image
        .save(&aug_image_path)
        .map_err(|source| CurateError::ImageWrite {
            path: aug_image_path.clone(),
            source,
        })?;
    write_annotation_file(&output.label_path(&aug_stem), &aug_records)?;

    Ok(AugmentOutcome::Augmented {
        objects: aug_records.len(),
    })
}

/// Augment every unprocessed image in `input` into `output`.
///
/// Images are visited in file name order and each gets its own RNG seeded
/// from `rng`, so a fixed master seed reproduces the same output for the
/// same set of pending images.
pub fn augment_partition<A: Augment + ?Sized>(
    augmenter: &A,
    input: &PartitionDirs,
    output: &PartitionDirs,
    rng: &mut StdRng,
    seed: u64,
) -> Result<AugmentReport, CurateError> {
    output.ensure()?;
    let images = collect_images(&input.images)?;
    let existing = collect_image_stems(&output.images)?;
    info!(
        "Found {} image(s) in {}",
        images.len(),
        input.images.display()
    );

    let mut report = AugmentReport::new(seed);
    report.found = images.len();

    for image in images {
        let Some(stem) = file_stem(&image) else {
            error!("Skipping {}: file name is not valid UTF-8", image.display());
            report.failed += 1;
            continue;
        };

        if is_augmented_stem(&stem) {
            warn!(
                "Skipping {}: stem collides with the augmentation suffix",
                image.display()
            );
            report.skipped_derived += 1;
            continue;
        }
        if existing.contains(&stem) || existing.contains(&augmented_stem(&stem)) {
            debug!("Skipping already processed {}", image.display());
            report.skipped_existing += 1;
            continue;
        }

        let image_seed: u64 = rng.random();
        let mut image_rng = StdRng::seed_from_u64(image_seed);
        match augment_image(augmenter, &image, &input.labels, output, &mut image_rng) {
            Ok(AugmentOutcome::Augmented { objects }) => {
                info!("Augmented {} ({} object(s))", image.display(), objects);
                report.copied += 1;
                report.augmented += 1;
            }
            Ok(AugmentOutcome::OriginalOnly) => {
                info!(
                    "No valid annotations for {}; copied without augmentation",
                    image.display()
                );
                report.copied += 1;
                report.without_annotations += 1;
            }
            Ok(AugmentOutcome::BoxesLost) => {
                warn!(
                    "All boxes of {} left the image; augmented pair not written",
                    image.display()
                );
                report.copied += 1;
                report.boxes_lost += 1;
            }
            Err(err @ CurateError::UnreadableImage { .. }) => {
                warn!("{err}; skipping");
                report.unreadable += 1;
            }
            Err(err) => {
                error!("Failed to augment {}: {err}", image.display());
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Copy a partition from `input_root` to `output_root` without changing it.
///
/// Pairs already present at the destination are left alone and nothing is
/// ever deleted. A missing source partition is a warning, not an error.
pub fn mirror_partition(
    input_root: &Path,
    output_root: &Path,
    partition: Partition,
) -> Result<MirrorCounts, CurateError> {
    let source = PartitionDirs::for_partition(input_root, partition);
    let mut counts = MirrorCounts::new(partition);
    if !source.images.is_dir() {
        warn!(
            "Source partition {} does not exist; skipping copy for {}",
            source.images.display(),
            partition
        );
        counts.source_missing = true;
        return Ok(counts);
    }

    let dest = PartitionDirs::for_partition(output_root, partition);
    dest.ensure()?;

    for image in collect_images(&source.images)? {
        match copy_pair(&image, &source.labels, &dest) {
            Ok(CopyOutcome::Copied) => counts.copied += 1,
            Ok(CopyOutcome::CopiedWithoutAnnotation) => {
                warn!("No annotation file for {}", image.display());
                counts.copied += 1;
            }
            Ok(CopyOutcome::AlreadyPresent) => counts.already_present += 1,
            Err(err) => {
                error!("Failed to copy {}: {err}", image.display());
                counts.failed += 1;
            }
        }
    }

    info!(
        "Mirrored {}: {} copied, {} already present",
        partition, counts.copied, counts.already_present
    );
    Ok(counts)
}
