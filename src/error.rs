use std::path::PathBuf;
use thiserror::Error;

/// The main error type for yolo-curate operations.
///
/// Startup failures (`ConfigMissing`, `ClassSchemaParse`, `InvalidClassSchema`,
/// `AugmentConfigParse`, `InvalidAugmentConfig`, `InvalidSplitRatios`,
/// `LayoutInvalid`) abort a run.
/// Everything else is raised per image or per line and is caught at the stage
/// boundary.
#[derive(Debug, Error)]
pub enum CurateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration file missing or unusable at {path}: {message}")]
    ConfigMissing { path: PathBuf, message: String },

    #[error("Failed to parse class schema {path}: {source}")]
    ClassSchemaParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid class schema {path}: {message}")]
    InvalidClassSchema { path: PathBuf, message: String },

    #[error("Failed to parse augmentation config {path}: {source}")]
    AugmentConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid augmentation config {path}: {message}")]
    InvalidAugmentConfig { path: PathBuf, message: String },

    #[error("Cannot read image {path}: {message}")]
    UnreadableImage { path: PathBuf, message: String },

    #[error("Malformed annotation record in {path} at line {line}: {message}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Detection failed for {path}: {message}")]
    DetectionCapability { path: PathBuf, message: String },

    #[error("Invalid split ratios: {message}")]
    InvalidSplitRatios { message: String },

    #[error("Failed to write image {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write stats JSON to {path}: {source}")]
    StatsJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize report: {source}")]
    ReportSerialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid dataset layout at {path}: {message}")]
    LayoutInvalid { path: PathBuf, message: String },
}
