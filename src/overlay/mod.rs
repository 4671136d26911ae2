//! Draw annotation boxes over images for visual checks.

use std::fmt;
use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use log::{error, info, warn};
use serde::Serialize;

use crate::annotation::{clip_boxes, normalized_to_absolute, read_annotation_file, AbsoluteBox};
use crate::error::CurateError;
use crate::layout::{collect_images, file_stem, label_path_for};

const PALETTE: [[u8; 3]; 10] = [
    [230, 25, 75],
    [60, 180, 75],
    [255, 225, 25],
    [0, 130, 200],
    [245, 130, 48],
    [145, 30, 180],
    [70, 240, 240],
    [240, 50, 230],
    [210, 245, 60],
    [250, 190, 212],
];

/// Stable box colour for a class id.
pub fn class_color(class_id: u32) -> Rgb<u8> {
    Rgb(PALETTE[class_id as usize % PALETTE.len()])
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct OverlayReport {
    pub found: usize,
    pub written: usize,
    pub boxes_drawn: usize,
    pub unreadable: usize,
    pub failed: usize,
}

impl fmt::Display for OverlayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Overlay: {} of {} image(s) written, {} box(es) drawn",
            self.written, self.found, self.boxes_drawn
        )?;
        if self.unreadable + self.failed > 0 {
            writeln!(
                f,
                "  failed: {} (unreadable: {})",
                self.unreadable + self.failed,
                self.unreadable
            )?;
        }
        Ok(())
    }
}

/// Draw `boxes` onto `image` as hollow rectangles `thickness` pixels wide.
pub fn draw_boxes(image: &mut RgbImage, boxes: &[AbsoluteBox], thickness: u32) {
    for b in boxes {
        let color = class_color(b.class_id);
        for inset in 0..thickness as i64 {
            let width = b.width() - 2 * inset;
            let height = b.height() - 2 * inset;
            if width <= 0 || height <= 0 {
                break;
            }
            let rect = Rect::at((b.x1 + inset) as i32, (b.y1 + inset) as i32)
                .of_size(width as u32, height as u32);
            draw_hollow_rect_mut(image, rect, color);
        }
    }
}

/// Render one image with its annotation boxes into `output_dir`.
///
/// Returns the number of boxes drawn.
pub fn overlay_image(
    image_path: &Path,
    labels_dir: &Path,
    output_dir: &Path,
    thickness: u32,
) -> Result<usize, CurateError> {
    let unreadable = |message: String| CurateError::UnreadableImage {
        path: image_path.to_path_buf(),
        message,
    };
    let (Some(file_name), Some(stem)) = (image_path.file_name(), file_stem(image_path)) else {
        return Err(unreadable("file name is not valid UTF-8".to_string()));
    };

    let mut image = image::open(image_path)
        .map_err(|err| unreadable(err.to_string()))?
        .to_rgb8();
    let (width, height) = image.dimensions();

    let boxes: Vec<AbsoluteBox> = read_annotation_file(&label_path_for(labels_dir, &stem))?
        .iter()
        .map(|record| normalized_to_absolute(record, width, height))
        .collect();
    let boxes = clip_boxes(&boxes, width, height);
    draw_boxes(&mut image, &boxes, thickness);

    let out_path = output_dir.join(file_name);
    image
        .save(&out_path)
        .map_err(|source| CurateError::ImageWrite {
            path: out_path.clone(),
            source,
        })?;
    Ok(boxes.len())
}

/// Render every image in `images_dir`.
pub fn overlay_directory(
    images_dir: &Path,
    labels_dir: &Path,
    output_dir: &Path,
    thickness: u32,
) -> Result<OverlayReport, CurateError> {
    fs::create_dir_all(output_dir)?;
    let images = collect_images(images_dir)?;
    info!(
        "Visualizing {} image(s) from {}",
        images.len(),
        images_dir.display()
    );

    let mut report = OverlayReport {
        found: images.len(),
        ..Default::default()
    };

    for image in images {
        match overlay_image(&image, labels_dir, output_dir, thickness) {
            Ok(boxes) => {
                report.written += 1;
                report.boxes_drawn += boxes;
            }
            Err(err @ CurateError::UnreadableImage { .. }) => {
                warn!("{err}; skipping");
                report.unreadable += 1;
            }
            Err(err) => {
                error!("Failed to render {}: {err}", image.display());
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_are_stable_per_class() {
        assert_eq!(class_color(3), class_color(13));
        assert_ne!(class_color(0), class_color(1));
    }

    #[test]
    fn draws_box_outline_with_thickness() {
        let mut image = RgbImage::new(20, 20);
        draw_boxes(&mut image, &[AbsoluteBox::new(2, 2, 12, 12, 0)], 2);
        let color = class_color(0);
        assert_eq!(*image.get_pixel(2, 2), color);
        assert_eq!(*image.get_pixel(3, 3), color);
        assert_eq!(*image.get_pixel(7, 7), Rgb([0, 0, 0]));
    }

    #[test]
    fn overlay_directory_writes_rendered_images() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let images = temp.path().join("images");
        let labels = temp.path().join("labels");
        fs::create_dir_all(&images).expect("create images");
        fs::create_dir_all(&labels).expect("create labels");
        RgbImage::new(40, 40)
            .save(images.join("a.png"))
            .expect("write image");
        fs::write(labels.join("a.txt"), "1 0.5 0.5 0.5 0.5\n").expect("write label");
        fs::write(images.join("bad.jpg"), b"junk").expect("write junk");

        let out = temp.path().join("vis");
        let report = overlay_directory(&images, &labels, &out, 1).expect("overlay");
        assert_eq!(report.written, 1);
        assert_eq!(report.boxes_drawn, 1);
        assert_eq!(report.unreadable, 1);

        let rendered = image::open(out.join("a.png")).expect("open").to_rgb8();
        assert_eq!(*rendered.get_pixel(10, 10), class_color(1));
    }
}
