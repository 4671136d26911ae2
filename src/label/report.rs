//! Auto-labeling report.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Per-run counters for the auto-labeling stage.
#[derive(Clone, Debug, Default, Serialize)]
pub struct LabelReport {
    /// Images found in the input directory.
    pub found: usize,
    /// Images that received a new annotation file.
    pub written: usize,
    /// Images skipped because an annotation file already existed.
    pub skipped: usize,
    /// Images deleted because no usable detection remained.
    pub removed: usize,
    /// Images that could not be read.
    pub unreadable: usize,
    /// Images abandoned because the detector failed.
    pub detector_failed: usize,
    /// Other per-image I/O failures.
    pub failed: usize,
    /// Total objects written across all new annotation files.
    pub objects_written: usize,
    /// Detections dropped because their class is not in the schema.
    pub dropped_unknown_class: usize,
    /// Images labeled by this run, in processing order.
    pub labeled: Vec<PathBuf>,
}

impl LabelReport {
    /// Number of images that could not be handled this run.
    pub fn failure_count(&self) -> usize {
        self.unreadable + self.detector_failed + self.failed
    }
}

impl fmt::Display for LabelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Auto-label: {} image(s) found", self.found)?;
        writeln!(
            f,
            "  written: {} ({} object(s))",
            self.written, self.objects_written
        )?;
        writeln!(f, "  skipped (already labeled): {}", self.skipped)?;
        writeln!(f, "  removed (no usable detections): {}", self.removed)?;
        if self.dropped_unknown_class > 0 {
            writeln!(
                f,
                "  detections dropped (class not in schema): {}",
                self.dropped_unknown_class
            )?;
        }

        let failures = self.failure_count();
        if failures > 0 {
            writeln!(
                f,
                "  failed: {} (unreadable: {}, detector: {}, other: {})",
                failures, self.unreadable, self.detector_failed, self.failed
            )?;
        }
        Ok(())
    }
}
