//! Clamp-then-discard repair of annotation records.

use super::record::{AbsoluteBox, YoloRecord};

/// Repair a list of normalized records.
///
/// Each of `x_center`, `y_center`, `width` and `height` is clamped to
/// `[0, 1]` independently. Records whose clamped width or height is not
/// strictly positive are discarded, as are records with NaN fields. Infinite
/// values clamp to the nearest bound like any other out-of-range value.
/// Order is preserved and duplicates are kept.
pub fn repair_records(records: &[YoloRecord]) -> Vec<YoloRecord> {
    records.iter().filter_map(repair_record).collect()
}

/// Repair a single record, returning `None` if it must be discarded.
pub fn repair_record(record: &YoloRecord) -> Option<YoloRecord> {
    if record.has_nan() {
        return None;
    }

    let repaired = YoloRecord::new(
        record.class_id,
        record.x_center.clamp(0.0, 1.0),
        record.y_center.clamp(0.0, 1.0),
        record.width.clamp(0.0, 1.0),
        record.height.clamp(0.0, 1.0),
    );

    (repaired.width > 0.0 && repaired.height > 0.0).then_some(repaired)
}

/// Clip pixel boxes to `[0, width] x [0, height]` and drop the ones that
/// collapse to zero area.
///
/// This is the pixel-space counterpart of [`repair_records`], applied after
/// geometric transforms and to detector output.
pub fn clip_boxes(boxes: &[AbsoluteBox], image_width: u32, image_height: u32) -> Vec<AbsoluteBox> {
    let max_x = image_width as i64;
    let max_y = image_height as i64;

    boxes
        .iter()
        .map(|b| {
            AbsoluteBox::new(
                b.x1.clamp(0, max_x),
                b.y1.clamp(0, max_y),
                b.x2.clamp(0, max_x),
                b.y2.clamp(0, max_y),
                b.class_id,
            )
        })
        .filter(AbsoluteBox::is_ordered)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::parse_records;
    use std::path::Path;

    #[test]
    fn clamps_out_of_range_fields() {
        let repaired = repair_records(&[YoloRecord::new(0, 1.5, -0.2, 0.3, 2.0)]);
        assert_eq!(repaired, vec![YoloRecord::new(0, 1.0, 0.0, 0.3, 1.0)]);
    }

    #[test]
    fn discards_zero_area_records() {
        let repaired = repair_records(&[
            YoloRecord::new(0, 0.5, 0.5, 0.0, 0.3),
            YoloRecord::new(1, 0.5, 0.5, 0.3, -0.1),
            YoloRecord::new(2, 0.5, 0.5, 0.3, 0.3),
        ]);
        assert_eq!(repaired.len(), 1);
        assert_eq!(repaired[0].class_id, 2);
    }

    #[test]
    fn keeps_duplicates_and_order() {
        let r = YoloRecord::new(3, 0.4, 0.4, 0.1, 0.1);
        let other = YoloRecord::new(1, 0.6, 0.6, 0.1, 0.1);
        assert_eq!(repair_records(&[r, other, r]), vec![r, other, r]);
    }

    #[test]
    fn discards_nan_records() {
        assert!(repair_records(&[YoloRecord::new(0, f64::NAN, 0.5, 0.1, 0.1)]).is_empty());
    }

    #[test]
    fn clamps_infinite_fields_instead_of_discarding() {
        let records = parse_records(
            "0 0.5 0.5 inf 0.3\n1 1e400 0.5 0.2 0.3\n2 0.5 -inf 0.2 0.3\n3 0.5 0.5 0.2 -inf\n",
            Path::new("labels/a.txt"),
        );
        assert_eq!(records.len(), 4);
        assert_eq!(
            repair_records(&records),
            vec![
                YoloRecord::new(0, 0.5, 0.5, 1.0, 0.3),
                YoloRecord::new(1, 1.0, 0.5, 0.2, 0.3),
                YoloRecord::new(2, 0.5, 0.0, 0.2, 0.3),
            ]
        );
    }

    #[test]
    fn clip_boxes_clips_and_drops_collapsed() {
        let clipped = clip_boxes(
            &[
                AbsoluteBox::new(-10, -5, 50, 40, 0),
                AbsoluteBox::new(120, 10, 150, 20, 1),
                AbsoluteBox::new(90, 90, 130, 130, 2),
            ],
            100,
            100,
        );
        assert_eq!(
            clipped,
            vec![
                AbsoluteBox::new(0, 0, 50, 40, 0),
                AbsoluteBox::new(90, 90, 100, 100, 2),
            ]
        );
    }
}
