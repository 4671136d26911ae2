//! Annotation record types.
//!
//! Two representations are used throughout the pipeline:
//!
//! - [`YoloRecord`]: the persisted, normalized center-size form. Values are
//!   fractions of the accompanying image's width and height.
//! - [`AbsoluteBox`]: a transient pixel-corner form used while converting
//!   detector output and while applying geometric transforms.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalized YOLO annotation record.
///
/// `x_center`, `y_center`, `width` and `height` are fractions of the image
/// dimensions. A record is only meaningful together with the image it
/// accompanies.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YoloRecord {
    pub class_id: u32,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl YoloRecord {
    /// Creates a new record.
    #[inline]
    pub fn new(class_id: u32, x_center: f64, y_center: f64, width: f64, height: f64) -> Self {
        Self {
            class_id,
            x_center,
            y_center,
            width,
            height,
        }
    }

    /// Returns true if any of the four real-valued fields is NaN.
    #[inline]
    pub fn has_nan(&self) -> bool {
        self.x_center.is_nan() || self.y_center.is_nan() || self.width.is_nan() || self.height.is_nan()
    }

    /// Returns true if every real-valued field lies in `[0, 1]` and the box
    /// has positive extent.
    pub fn is_valid(&self) -> bool {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        in_unit(self.x_center)
            && in_unit(self.y_center)
            && in_unit(self.width)
            && in_unit(self.height)
            && self.width > 0.0
            && self.height > 0.0
    }
}

impl fmt::Debug for YoloRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YoloRecord")
            .field("class_id", &self.class_id)
            .field("x_center", &self.x_center)
            .field("y_center", &self.y_center)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// An axis-aligned box in integer pixel corner form (x1, y1, x2, y2).
///
/// Like the normalized record, this type does not enforce `x1 < x2` in its
/// constructor: geometric transforms can produce degenerate boxes, and the
/// repair step is what filters them out.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AbsoluteBox {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
    pub class_id: u32,
}

impl AbsoluteBox {
    /// Creates a new box from explicit corners.
    #[inline]
    pub fn new(x1: i64, y1: i64, x2: i64, y2: i64, class_id: u32) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            class_id,
        }
    }

    /// Creates a box from real-valued corners, rounding each to the nearest
    /// pixel and reordering so that the minimum corner comes first.
    pub fn from_corners_f64(x1: f64, y1: f64, x2: f64, y2: f64, class_id: u32) -> Self {
        let (xa, xb) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let (ya, yb) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        Self::new(
            xa.round() as i64,
            ya.round() as i64,
            xb.round() as i64,
            yb.round() as i64,
            class_id,
        )
    }

    /// Returns the width of the box. Negative if malformed.
    #[inline]
    pub fn width(&self) -> i64 {
        self.x2 - self.x1
    }

    /// Returns the height of the box. Negative if malformed.
    #[inline]
    pub fn height(&self) -> i64 {
        self.y2 - self.y1
    }

    /// Returns true if the box has strictly positive extent on both axes.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }

    /// Returns the four corners in clockwise order starting at (x1, y1).
    pub fn corners(&self) -> [(f64, f64); 4] {
        let (x1, y1, x2, y2) = (
            self.x1 as f64,
            self.y1 as f64,
            self.x2 as f64,
            self.y2 as f64,
        );
        [(x1, y1), (x2, y1), (x2, y2), (x1, y2)]
    }
}

impl fmt::Debug for AbsoluteBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbsoluteBox")
            .field("x1", &self.x1)
            .field("y1", &self.y1)
            .field("x2", &self.x2)
            .field("y2", &self.y2)
            .field("class_id", &self.class_id)
            .finish()
    }
}
