//! Augmentation report.

use serde::Serialize;
use std::fmt;

use crate::layout::Partition;

/// Per-run counters for the augmentation stage.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AugmentReport {
    pub seed: u64,
    /// Images found in the input train partition.
    pub found: usize,
    /// Originals copied into the processed tree.
    pub copied: usize,
    /// Synthetic `_aug` pairs written.
    pub augmented: usize,
    /// Originals with no valid annotation after repair; no `_aug` pair.
    pub without_annotations: usize,
    /// Originals whose boxes were all lost to the transform; no `_aug` pair.
    pub boxes_lost: usize,
    /// Images already present in the processed tree.
    pub skipped_existing: usize,
    /// Input images whose stem already carries the augmentation suffix.
    pub skipped_derived: usize,
    /// Images that could not be read.
    pub unreadable: usize,
    /// Other per-image failures.
    pub failed: usize,
    /// Val/test partitions mirrored from the input tree.
    pub mirrored: Vec<MirrorCounts>,
}

impl AugmentReport {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }
}

/// Counters for one mirrored partition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MirrorCounts {
    pub partition: Partition,
    pub copied: usize,
    pub already_present: usize,
    pub failed: usize,
    /// True if the source partition did not exist.
    pub source_missing: bool,
}

impl MirrorCounts {
    pub fn new(partition: Partition) -> Self {
        Self {
            partition,
            copied: 0,
            already_present: 0,
            failed: 0,
            source_missing: false,
        }
    }
}

impl fmt::Display for AugmentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Augment: {} train image(s) found (seed {})",
            self.found, self.seed
        )?;
        writeln!(f, "  originals copied: {}", self.copied)?;
        writeln!(f, "  augmented pairs written: {}", self.augmented)?;
        writeln!(
            f,
            "  no augmentation (no valid annotations): {}",
            self.without_annotations
        )?;
        if self.boxes_lost > 0 {
            writeln!(
                f,
                "  no augmentation (boxes lost in transform): {}",
                self.boxes_lost
            )?;
        }
        writeln!(
            f,
            "  skipped (already processed): {}",
            self.skipped_existing
        )?;
        if self.skipped_derived > 0 {
            writeln!(f, "  skipped (derived input): {}", self.skipped_derived)?;
        }
        if self.unreadable + self.failed > 0 {
            writeln!(
                f,
                "  failed: {} (unreadable: {})",
                self.unreadable + self.failed,
                self.unreadable
            )?;
        }

        for mirror in &self.mirrored {
            if mirror.source_missing {
                writeln!(f, "  {}: source partition missing", mirror.partition)?;
                continue;
            }
            write!(
                f,
                "  {}: mirrored {}, already present {}",
                mirror.partition, mirror.copied, mirror.already_present
            )?;
            if mirror.failed > 0 {
                write!(f, ", failed {}", mirror.failed)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
