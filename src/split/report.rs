//! Partition assignment report.

use serde::Serialize;
use std::fmt;

use crate::layout::Partition;

/// Counters for one destination partition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PartitionCounts {
    /// Images assigned to this partition by the shuffle.
    pub assigned: usize,
    /// Image/annotation pairs copied.
    pub copied: usize,
    /// Images skipped because both files already existed at the destination.
    pub already_present: usize,
    /// Images copied without an annotation file.
    pub missing_annotation: usize,
    /// Images that failed to copy.
    pub failed: usize,
}

/// The result of one partition assignment run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SplitReport {
    pub seed: u64,
    pub train: PartitionCounts,
    pub val: PartitionCounts,
    pub test: PartitionCounts,
}

impl SplitReport {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    pub fn get(&self, partition: Partition) -> &PartitionCounts {
        match partition {
            Partition::Train => &self.train,
            Partition::Val => &self.val,
            Partition::Test => &self.test,
        }
    }

    pub fn get_mut(&mut self, partition: Partition) -> &mut PartitionCounts {
        match partition {
            Partition::Train => &mut self.train,
            Partition::Val => &mut self.val,
            Partition::Test => &mut self.test,
        }
    }

    /// Total images handed to the assigner.
    pub fn total_assigned(&self) -> usize {
        Partition::ALL.iter().map(|p| self.get(*p).assigned).sum()
    }
}

impl fmt::Display for SplitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Split: {} image(s) (seed {})",
            self.total_assigned(),
            self.seed
        )?;
        for partition in Partition::ALL {
            let counts = self.get(partition);
            write!(
                f,
                "  {:<5} assigned {:>5}, copied {:>5}, already present {:>5}",
                partition.as_str(),
                counts.assigned,
                counts.copied,
                counts.already_present
            )?;
            if counts.missing_annotation > 0 {
                write!(f, ", missing annotation {}", counts.missing_annotation)?;
            }
            if counts.failed > 0 {
                write!(f, ", failed {}", counts.failed)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
