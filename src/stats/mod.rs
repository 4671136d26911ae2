//! Partition statistics.
//!
//! A read-only scan of `images/` + `labels/` pairs. Annotation lines are
//! counted leniently: any line with at least five tokens whose first token
//! is a class index counts as one object, whether or not the coordinates
//! would pass the strict record parser.

mod report;

pub use report::{PartitionStats, StatsReport};

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, warn};

use crate::error::CurateError;
use crate::layout::{collect_images, collect_label_files, Partition, PartitionDirs};

/// Minimum whitespace-separated tokens for a line to count as an object.
const MIN_OBJECT_TOKENS: usize = 5;

/// Scan one `images/` + `labels/` pair.
///
/// A missing label directory counts as zero annotation files.
pub fn analyze_partition(dirs: &PartitionDirs) -> Result<PartitionStats, CurateError> {
    let total_images = collect_images(&dirs.images)?.len();
    let label_files = if dirs.labels.is_dir() {
        collect_label_files(&dirs.labels)?
    } else {
        Vec::new()
    };

    let mut objects_per_class: BTreeMap<u32, usize> = BTreeMap::new();
    let mut total_objects = 0usize;

    for label_file in &label_files {
        let content = fs::read_to_string(label_file)?;
        for line in content.lines() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < MIN_OBJECT_TOKENS {
                continue;
            }
            let Ok(class_id) = tokens[0].parse::<u32>() else {
                debug!(
                    "Ignoring line with non-integer class in {}: {line}",
                    label_file.display()
                );
                continue;
            };
            *objects_per_class.entry(class_id).or_insert(0) += 1;
            total_objects += 1;
        }
    }

    Ok(PartitionStats {
        total_images,
        total_labels: label_files.len(),
        total_objects,
        avg_objects_per_image: average(total_objects, total_images),
        objects_per_class,
    })
}

/// Average rounded to two decimals, or 0 when there are no images.
fn average(objects: usize, images: usize) -> f64 {
    if images == 0 {
        return 0.0;
    }
    (objects as f64 / images as f64 * 100.0).round() / 100.0
}

/// Scan the requested partitions under `root`.
///
/// Partitions whose image directory does not exist are skipped with a
/// warning.
pub fn analyze_dataset(root: &Path, partitions: &[Partition]) -> Result<StatsReport, CurateError> {
    let mut report = StatsReport::default();
    for &partition in partitions {
        let dirs = PartitionDirs::for_partition(root, partition);
        if !dirs.images.is_dir() {
            warn!(
                "Partition {} not found at {}; skipping",
                partition,
                dirs.images.display()
            );
            continue;
        }
        report
            .partitions
            .insert(partition, analyze_partition(&dirs)?);
    }
    Ok(report)
}

/// Write a report as pretty-printed JSON.
pub fn write_json(report: &StatsReport, path: &Path) -> Result<(), CurateError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report).map_err(|source| {
        CurateError::StatsJsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
