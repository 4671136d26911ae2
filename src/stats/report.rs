//! Stats report types and terminal formatting.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::layout::Partition;

/// Width of histogram bars (in characters).
const BAR_WIDTH: usize = 20;

/// Statistics for one partition.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PartitionStats {
    /// Image files in `images/`.
    pub total_images: usize,
    /// Annotation files in `labels/`.
    pub total_labels: usize,
    /// Object lines across all annotation files.
    pub total_objects: usize,
    /// `total_objects / total_images`, two decimals; 0 with no images.
    pub avg_objects_per_image: f64,
    /// Object count per class index.
    pub objects_per_class: BTreeMap<u32, usize>,
}

/// Statistics keyed by partition name.
///
/// Serializes as a flat map, e.g. `{"train": {...}, "val": {...}}`.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct StatsReport {
    pub partitions: BTreeMap<Partition, PartitionStats>,
    /// Display-only class names, indexed by class id.
    #[serde(skip)]
    class_names: Vec<String>,
}

impl StatsReport {
    /// Use `names` to label classes in the text rendering.
    pub fn with_class_names(mut self, names: Vec<String>) -> Self {
        self.class_names = names;
        self
    }

    pub fn get(&self, partition: Partition) -> Option<&PartitionStats> {
        self.partitions.get(&partition)
    }

    fn class_label(&self, class_id: u32) -> String {
        self.class_names
            .get(class_id as usize)
            .cloned()
            .unwrap_or_else(|| format!("class_{class_id}"))
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.partitions.is_empty() {
            return writeln!(f, "No partitions found.");
        }

        for (partition, stats) in &self.partitions {
            writeln!(f, "┌─ {} {}", partition, "─".repeat(40))?;
            writeln!(f, "│   Images:        {:>8}", format_number(stats.total_images))?;
            writeln!(f, "│   Label files:   {:>8}", format_number(stats.total_labels))?;
            writeln!(f, "│   Objects:       {:>8}", format_number(stats.total_objects))?;
            writeln!(f, "│   Avg / image:   {:>8.2}", stats.avg_objects_per_image)?;

            if !stats.objects_per_class.is_empty() {
                writeln!(f, "│")?;
                let max_count = stats.objects_per_class.values().copied().max().unwrap_or(1);
                for (&class_id, &count) in &stats.objects_per_class {
                    let pct = if stats.total_objects > 0 {
                        (count as f64 / stats.total_objects as f64) * 100.0
                    } else {
                        0.0
                    };
                    writeln!(
                        f,
                        "│   {:<16} {:>7} {:>5.1}%  {}",
                        truncate_label(&self.class_label(class_id), 16),
                        format_number(count),
                        pct,
                        render_bar(count, max_count, BAR_WIDTH)
                    )?;
                }
            }
            writeln!(f, "└{}", "─".repeat(43))?;
        }
        Ok(())
    }
}

/// Format a number with thousands separators.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Render a horizontal bar using Unicode block characters.
fn render_bar(count: usize, max_count: usize, width: usize) -> String {
    if max_count == 0 || width == 0 {
        return String::new();
    }

    let filled = ((count * width) / max_count).min(width);
    "█".repeat(filled) + &"░".repeat(width - filled)
}

fn truncate_label(label: &str, max_len: usize) -> String {
    if label.chars().count() <= max_len {
        label.to_string()
    } else {
        let head: String = label.chars().take(max_len - 1).collect();
        format!("{head}…")
    }
}
