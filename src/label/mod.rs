//! Auto-labeling of raw images through an external detector.
//!
//! For each image without an annotation file, the detector is invoked once,
//! its class names are translated through the [`ClassSchema`], and the
//! surviving boxes are written as a normalized annotation file. Images for
//! which nothing usable remains are deleted from the input directory: an
//! image the detector cannot label is treated as noise rather than as a
//! negative example.

mod detector;
mod report;

pub use detector::{
    filter_by_confidence, CommandDetector, Detection, Detector, JsonDirDetector, CONFIDENCE_ENV,
};
pub use report::LabelReport;

use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info, warn};

use crate::annotation::{
    absolute_to_normalized, clip_boxes, write_annotation_file, AbsoluteBox, ClassSchema,
    YoloRecord,
};
use crate::error::CurateError;
use crate::layout::{collect_images, file_stem, label_path_for};

/// What happened to a single image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelOutcome {
    /// A new annotation file was written.
    Written { objects: usize, dropped: usize },
    /// An annotation file already existed; the detector was not invoked.
    Skipped,
    /// No usable detection remained; the image was deleted.
    Removed { dropped: usize },
}

/// Labels images with a [`Detector`] and writes annotation files to
/// `labels_dir`.
pub struct AutoLabeler<'a, D: Detector> {
    detector: D,
    schema: &'a ClassSchema,
    labels_dir: PathBuf,
}

impl<'a, D: Detector> AutoLabeler<'a, D> {
    pub fn new(detector: D, schema: &'a ClassSchema, labels_dir: impl Into<PathBuf>) -> Self {
        Self {
            detector,
            schema,
            labels_dir: labels_dir.into(),
        }
    }

    pub fn labels_dir(&self) -> &Path {
        &self.labels_dir
    }

    /// Label one image.
    ///
    /// Unreadable images yield [`CurateError::UnreadableImage`] and detector
    /// failures yield [`CurateError::DetectionCapability`]; in both cases
    /// nothing is written or deleted.
    pub fn label(&self, image: &Path) -> Result<LabelOutcome, CurateError> {
        let stem = file_stem(image).ok_or_else(|| CurateError::UnreadableImage {
            path: image.to_path_buf(),
            message: "file name is not valid UTF-8".to_string(),
        })?;

        let label_path = label_path_for(&self.labels_dir, &stem);
        if label_path.exists() {
            return Ok(LabelOutcome::Skipped);
        }

        let (width, height) = read_image_dimensions(image)?;
        let detections = self.detector.detect(image)?;

        let mut boxes = Vec::with_capacity(detections.len());
        let mut dropped = 0usize;
        for detection in &detections {
            let Some(class_id) = self.schema.index_of(&detection.class_name) else {
                dropped += 1;
                continue;
            };
            let [x1, y1, x2, y2] = detection.bbox;
            boxes.push(AbsoluteBox::from_corners_f64(x1, y1, x2, y2, class_id));
        }

        let boxes = clip_boxes(&boxes, width, height);
        if boxes.is_empty() {
            fs::remove_file(image)?;
            return Ok(LabelOutcome::Removed { dropped });
        }

        let records: Vec<YoloRecord> = boxes
            .iter()
            .map(|b| absolute_to_normalized(b, width, height))
            .collect();
        write_annotation_file(&label_path, &records)?;

        Ok(LabelOutcome::Written {
            objects: records.len(),
            dropped,
        })
    }

    /// Label every image directly inside `input_dir`.
    ///
    /// Per-image failures are logged and counted; only a missing input
    /// directory or an uncreatable label directory is returned as an error.
    pub fn label_directory(&self, input_dir: &Path) -> Result<LabelReport, CurateError> {
        fs::create_dir_all(&self.labels_dir)?;
        let images = collect_images(input_dir)?;
        info!("Found {} image(s) in {}", images.len(), input_dir.display());

        let mut report = LabelReport {
            found: images.len(),
            ..Default::default()
        };

        for image in images {
            match self.label(&image) {
                Ok(LabelOutcome::Written { objects, dropped }) => {
                    info!("Labeled {} ({} object(s))", image.display(), objects);
                    report.written += 1;
                    report.objects_written += objects;
                    report.dropped_unknown_class += dropped;
                    report.labeled.push(image);
                }
                Ok(LabelOutcome::Skipped) => {
                    info!("Skipping already labeled {}", image.display());
                    report.skipped += 1;
                }
                Ok(LabelOutcome::Removed { dropped }) => {
                    info!("No usable detections in {}; removed", image.display());
                    report.removed += 1;
                    report.dropped_unknown_class += dropped;
                }
                Err(err @ CurateError::UnreadableImage { .. }) => {
                    warn!("{err}; skipping");
                    report.unreadable += 1;
                }
                Err(err @ CurateError::DetectionCapability { .. }) => {
                    error!("{err}");
                    report.detector_failed += 1;
                }
                Err(err) => {
                    error!("Failed to label {}: {err}", image.display());
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

/// Read image dimensions from the file header.
pub fn read_image_dimensions(path: &Path) -> Result<(u32, u32), CurateError> {
    let size = imagesize::size(path).map_err(|err| CurateError::UnreadableImage {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    let width: u32 = size
        .width
        .try_into()
        .map_err(|_| CurateError::UnreadableImage {
            path: path.to_path_buf(),
            message: format!("image width {} does not fit in u32", size.width),
        })?;
    let height: u32 = size
        .height
        .try_into()
        .map_err(|_| CurateError::UnreadableImage {
            path: path.to_path_buf(),
            message: format!("image height {} does not fit in u32", size.height),
        })?;

    if width == 0 || height == 0 {
        return Err(CurateError::UnreadableImage {
            path: path.to_path_buf(),
            message: format!("invalid dimensions {width}x{height}"),
        });
    }

    Ok((width, height))
}
