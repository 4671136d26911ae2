//! Conversions between normalized records and absolute boxes, plus the
//! on-disk line format.
//!
//! Line format: `<class_id> <x_center> <y_center> <width> <height>`, one
//! object per line, real values written with six decimal places.
//!
//! The normalized → absolute direction rounds to whole pixels and is
//! therefore lossy: a record survives a round trip only to within one pixel
//! of the image dimensions it is encoded against.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::warn;

use super::record::{AbsoluteBox, YoloRecord};
use crate::error::CurateError;

/// Convert a normalized record to integer pixel corners.
///
/// No clamping is performed; run [`repair_records`](super::repair_records)
/// first if the record may be out of range.
pub fn normalized_to_absolute(
    record: &YoloRecord,
    image_width: u32,
    image_height: u32,
) -> AbsoluteBox {
    let w = image_width as f64;
    let h = image_height as f64;
    let half_w = record.width / 2.0;
    let half_h = record.height / 2.0;

    AbsoluteBox::new(
        ((record.x_center - half_w) * w).round() as i64,
        ((record.y_center - half_h) * h).round() as i64,
        ((record.x_center + half_w) * w).round() as i64,
        ((record.y_center + half_h) * h).round() as i64,
        record.class_id,
    )
}

/// Convert integer pixel corners back to a normalized record.
pub fn absolute_to_normalized(
    bbox: &AbsoluteBox,
    image_width: u32,
    image_height: u32,
) -> YoloRecord {
    let w = image_width as f64;
    let h = image_height as f64;
    let (x1, y1, x2, y2) = (bbox.x1 as f64, bbox.y1 as f64, bbox.x2 as f64, bbox.y2 as f64);

    YoloRecord::new(
        bbox.class_id,
        (x1 + x2) / 2.0 / w,
        (y1 + y2) / 2.0 / h,
        (x2 - x1) / w,
        (y2 - y1) / h,
    )
}

/// Format a record as a single annotation line (without trailing newline).
pub fn format_record(record: &YoloRecord) -> String {
    format!(
        "{} {:.6} {:.6} {:.6} {:.6}",
        record.class_id, record.x_center, record.y_center, record.width, record.height
    )
}

/// Parse one annotation line.
///
/// Blank lines yield `Ok(None)`. Lines that do not split into exactly five
/// whitespace-separated tokens, or whose tokens fail to parse, yield
/// [`CurateError::MalformedRecord`].
pub fn parse_record_line(
    line: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<Option<YoloRecord>, CurateError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // Take at most 6 tokens so pathological inputs do not allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(6).collect();
    if tokens.len() != 5 {
        let found = if tokens.len() > 5 {
            "more than 5".to_string()
        } else {
            tokens.len().to_string()
        };
        return Err(CurateError::MalformedRecord {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("expected 5 tokens, found {found}"),
        });
    }

    let class_id = tokens[0]
        .parse::<u32>()
        .map_err(|_| CurateError::MalformedRecord {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!(
                "invalid class_id '{}'; expected non-negative integer",
                tokens[0]
            ),
        })?;

    let x_center = parse_f64_token(tokens[1], "x_center", file_path, line_num)?;
    let y_center = parse_f64_token(tokens[2], "y_center", file_path, line_num)?;
    let width = parse_f64_token(tokens[3], "width", file_path, line_num)?;
    let height = parse_f64_token(tokens[4], "height", file_path, line_num)?;

    Ok(Some(YoloRecord::new(
        class_id, x_center, y_center, width, height,
    )))
}

/// Fuzz-only entrypoint for single-line record parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_record_line(input: &str) -> Result<(), CurateError> {
    let _ = parse_record_line(input, Path::new("<fuzz>"), 1)?;
    Ok(())
}

fn parse_f64_token(
    raw: &str,
    field_name: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<f64, CurateError> {
    raw.parse::<f64>()
        .map_err(|_| CurateError::MalformedRecord {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("invalid {field_name} '{raw}'; expected floating-point number"),
        })
}

/// Parse the contents of an annotation file.
///
/// Malformed lines are logged and skipped; the rest of the file is kept.
pub fn parse_records(content: &str, file_path: &Path) -> Vec<YoloRecord> {
    let mut records = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        match parse_record_line(line, file_path, line_idx + 1) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(err) => warn!("Skipping line: {err}"),
        }
    }
    records
}

/// Read an annotation file.
///
/// A missing file is a valid "no objects" state and yields an empty list.
pub fn read_annotation_file(path: &Path) -> Result<Vec<YoloRecord>, CurateError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    Ok(parse_records(&content, path))
}

/// Write records to an annotation file, one line each.
///
/// An empty slice produces an empty file.
pub fn write_annotation_file(path: &Path, records: &[YoloRecord]) -> Result<(), CurateError> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    for record in records {
        writeln!(writer, "{}", format_record(record))?;
    }
    writer.flush()?;
    Ok(())
}
