#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use yolo_curate::annotation::YoloRecord;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Image dimensions seen in practice, from thumbnails to 4K frames.
pub fn arb_dimensions() -> impl Strategy<Value = (u32, u32)> {
    (16u32..=3840, 16u32..=2160)
}

/// A valid record whose box lies fully inside the unit square.
pub fn arb_inside_record() -> impl Strategy<Value = YoloRecord> {
    (0u32..80, 0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0)
        .prop_filter("box must have extent", |(_, a, b, c, d)| {
            (a - b).abs() > 0.01 && (c - d).abs() > 0.01
        })
        .prop_map(|(class_id, a, b, c, d)| {
            let (x1, x2) = (a.min(b), a.max(b));
            let (y1, y2) = (c.min(d), c.max(d));
            YoloRecord::new(class_id, (x1 + x2) / 2.0, (y1 + y2) / 2.0, x2 - x1, y2 - y1)
        })
}

/// A raw value as a noisy detector might emit it: often out of range,
/// sometimes exactly on a boundary.
pub fn arb_raw_value() -> impl Strategy<Value = f64> {
    prop_oneof![
        4 => -2.0f64..3.0,
        1 => Just(0.0),
        1 => Just(1.0),
        1 => Just(1.5),
        1 => Just(-0.25),
    ]
}

pub fn arb_raw_record() -> impl Strategy<Value = YoloRecord> {
    (
        0u32..80,
        arb_raw_value(),
        arb_raw_value(),
        arb_raw_value(),
        arb_raw_value(),
    )
        .prop_map(|(class_id, x, y, w, h)| YoloRecord::new(class_id, x, y, w, h))
}
