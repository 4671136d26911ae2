//! Annotation primitives shared by every pipeline stage.
//!
//! - [`record`]: normalized records and absolute pixel boxes
//! - [`codec`]: conversion between the two, and the text line format
//! - [`repair`]: clamp-then-discard validation
//! - [`schema`]: the class name ↔ index mapping
//!
//! # Example
//!
//! ```
//! use yolo_curate::annotation::{absolute_to_normalized, normalized_to_absolute, YoloRecord};
//!
//! let record = YoloRecord::new(0, 0.2, 0.5, 0.1, 0.1);
//! let bbox = normalized_to_absolute(&record, 640, 480);
//! assert_eq!((bbox.x1, bbox.x2), (96, 160));
//!
//! let back = absolute_to_normalized(&bbox, 640, 480);
//! assert!((back.x_center - 0.2).abs() < 1e-9);
//! ```

pub mod codec;
mod record;
mod repair;
mod schema;

pub use codec::{
    absolute_to_normalized, format_record, normalized_to_absolute, parse_record_line,
    parse_records, read_annotation_file, write_annotation_file,
};
pub use record::{AbsoluteBox, YoloRecord};
pub use repair::{clip_boxes, repair_record, repair_records};
pub use schema::ClassSchema;
