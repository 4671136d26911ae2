//! Detection capability adapters.
//!
//! The object detector itself lives outside this crate. A [`Detector`] is
//! anything that turns an image path into a list of [`Detection`]s that have
//! already been filtered by a confidence threshold.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

use crate::error::CurateError;
use crate::layout::file_stem;

/// Environment variable through which [`CommandDetector`] passes its
/// confidence threshold to the external program.
pub const CONFIDENCE_ENV: &str = "CURATE_CONFIDENCE";

/// One detected object in absolute pixel coordinates.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Detection {
    /// `[x1, y1, x2, y2]` pixel corners.
    #[serde(alias = "box")]
    pub bbox: [f64; 4],
    /// Detector-side class name, translated through the class schema.
    #[serde(alias = "name")]
    pub class_name: String,
    #[serde(default = "full_confidence")]
    pub confidence: f64,
}

fn full_confidence() -> f64 {
    1.0
}

impl Detection {
    pub fn new(bbox: [f64; 4], class_name: impl Into<String>, confidence: f64) -> Self {
        Self {
            bbox,
            class_name: class_name.into(),
            confidence,
        }
    }
}

/// An object-detection capability: image → detections.
pub trait Detector {
    fn detect(&self, image: &Path) -> Result<Vec<Detection>, CurateError>;
}

impl<D: Detector + ?Sized> Detector for &D {
    fn detect(&self, image: &Path) -> Result<Vec<Detection>, CurateError> {
        (**self).detect(image)
    }
}

/// Runs an external program once per image.
///
/// The program receives its fixed arguments followed by the image path, with
/// the confidence threshold in `CURATE_CONFIDENCE`. It must print a JSON
/// array of detections on stdout and exit successfully. No timeout is
/// applied.
#[derive(Clone, Debug)]
pub struct CommandDetector {
    program: PathBuf,
    args: Vec<String>,
    confidence: f64,
}

impl CommandDetector {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, confidence: f64) -> Self {
        Self {
            program: program.into(),
            args,
            confidence,
        }
    }
}

impl Detector for CommandDetector {
    fn detect(&self, image: &Path) -> Result<Vec<Detection>, CurateError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image)
            .env(CONFIDENCE_ENV, self.confidence.to_string())
            .output()
            .map_err(|err| CurateError::DetectionCapability {
                path: image.to_path_buf(),
                message: format!("failed to run '{}': {err}", self.program.display()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CurateError::DetectionCapability {
                path: image.to_path_buf(),
                message: format!(
                    "'{}' exited with {}: {}",
                    self.program.display(),
                    output.status,
                    stderr.trim()
                ),
            });
        }

        let detections = parse_detections(&output.stdout, image)?;
        Ok(filter_by_confidence(detections, self.confidence))
    }
}

/// Reads precomputed detections from `<dir>/<stem>.json`.
///
/// A missing file means the detector found nothing in that image.
#[derive(Clone, Debug)]
pub struct JsonDirDetector {
    dir: PathBuf,
    confidence: f64,
}

impl JsonDirDetector {
    pub fn new(dir: impl Into<PathBuf>, confidence: f64) -> Self {
        Self {
            dir: dir.into(),
            confidence,
        }
    }
}

impl Detector for JsonDirDetector {
    fn detect(&self, image: &Path) -> Result<Vec<Detection>, CurateError> {
        let stem = file_stem(image).ok_or_else(|| CurateError::DetectionCapability {
            path: image.to_path_buf(),
            message: "image file name is not valid UTF-8".to_string(),
        })?;

        let json_path = self.dir.join(format!("{stem}.json"));
        if !json_path.is_file() {
            return Ok(Vec::new());
        }

        let bytes = fs::read(&json_path).map_err(|err| CurateError::DetectionCapability {
            path: image.to_path_buf(),
            message: format!("cannot read {}: {err}", json_path.display()),
        })?;
        let detections = parse_detections(&bytes, image)?;
        Ok(filter_by_confidence(detections, self.confidence))
    }
}

fn parse_detections(bytes: &[u8], image: &Path) -> Result<Vec<Detection>, CurateError> {
    serde_json::from_slice(bytes).map_err(|err| CurateError::DetectionCapability {
        path: image.to_path_buf(),
        message: format!("invalid detection JSON: {err}"),
    })
}

/// Keep detections whose confidence is at least `threshold`.
pub fn filter_by_confidence(detections: Vec<Detection>, threshold: f64) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| d.confidence >= threshold)
        .collect()
}
