//! On-disk dataset layout.
//!
//! Every image directory is paired with a label directory, and an image is
//! joined to its annotation file by stem:
//!
//! ```text
//! <root>/
//!   train/images/<stem>.{jpg,png}   train/labels/<stem>.txt
//!   val/images/...                  val/labels/...
//!   test/images/...                 test/labels/...
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::CurateError;

/// Raster formats accepted as dataset images.
pub const IMAGE_EXTENSIONS: [&str; 2] = ["jpg", "png"];
pub const LABEL_EXTENSION: &str = "txt";

/// Stem suffix marking a synthetic augmented image.
pub const AUG_SUFFIX: &str = "_aug";

/// One of the three dataset partitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Train,
    Val,
    Test,
}

impl Partition {
    pub const ALL: [Partition; 3] = [Partition::Train, Partition::Val, Partition::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Train => "train",
            Partition::Val => "val",
            Partition::Test => "test",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An `images/` + `labels/` directory pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionDirs {
    pub images: PathBuf,
    pub labels: PathBuf,
}

impl PartitionDirs {
    pub fn new(images: impl Into<PathBuf>, labels: impl Into<PathBuf>) -> Self {
        Self {
            images: images.into(),
            labels: labels.into(),
        }
    }

    /// `<root>/<partition>/{images,labels}`.
    pub fn for_partition(root: &Path, partition: Partition) -> Self {
        let base = root.join(partition.as_str());
        Self::new(base.join("images"), base.join("labels"))
    }

    /// Create both directories if absent. Safe to call concurrently.
    pub fn ensure(&self) -> Result<(), CurateError> {
        fs::create_dir_all(&self.images)?;
        fs::create_dir_all(&self.labels)?;
        Ok(())
    }

    /// True if both directories exist.
    pub fn exists(&self) -> bool {
        self.images.is_dir() && self.labels.is_dir()
    }

    /// Annotation path for an image stem.
    pub fn label_path(&self, stem: &str) -> PathBuf {
        label_path_for(&self.labels, stem)
    }
}

/// `<labels_dir>/<stem>.txt`.
pub fn label_path_for(labels_dir: &Path, stem: &str) -> PathBuf {
    labels_dir.join(format!("{stem}.{LABEL_EXTENSION}"))
}

/// The file stem as an owned string, if it is valid UTF-8.
pub fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

/// True if `stem` names a synthetic augmented image.
pub fn is_augmented_stem(stem: &str) -> bool {
    stem.ends_with(AUG_SUFFIX)
}

/// Stem of the augmented derivative of `stem`.
pub fn augmented_stem(stem: &str) -> String {
    format!("{stem}{AUG_SUFFIX}")
}

/// List the image files directly inside `dir`, sorted by file name.
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>, CurateError> {
    collect_files_with_extensions(dir, &IMAGE_EXTENSIONS)
}

/// List the annotation files directly inside `dir`, sorted by file name.
pub fn collect_label_files(dir: &Path) -> Result<Vec<PathBuf>, CurateError> {
    collect_files_with_extensions(dir, &[LABEL_EXTENSION])
}

/// Stems of every image directly inside `dir`. A missing directory is empty.
pub fn collect_image_stems(dir: &Path) -> Result<BTreeSet<String>, CurateError> {
    if !dir.is_dir() {
        return Ok(BTreeSet::new());
    }
    Ok(collect_images(dir)?
        .iter()
        .filter_map(|path| file_stem(path))
        .collect())
}

fn collect_files_with_extensions(
    root: &Path,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, CurateError> {
    if !root.is_dir() {
        return Err(CurateError::LayoutInvalid {
            path: root.to_path_buf(),
            message: "expected a directory".to_string(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = entry.map_err(|source| CurateError::LayoutInvalid {
            path: root.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}
