//! Individual augmentation steps.
//!
//! Geometric steps move the boxes together with the pixels. Photometric
//! steps leave the boxes untouched, including dropout holes that land on
//! an object.

use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::noise::gaussian_noise;
use imageproc::rect::Rect;
use rand::{rngs::StdRng, RngExt};

use super::config::{
    BrightnessContrastConfig, DropoutConfig, FlipConfig, HsvConfig, MotionBlurConfig,
    NoiseConfig, RotateConfig,
};
use crate::annotation::AbsoluteBox;

/// An image and its boxes in pixel coordinates.
#[derive(Clone, Debug)]
pub struct Sample {
    pub image: RgbImage,
    pub boxes: Vec<AbsoluteBox>,
}

impl Sample {
    pub fn new(image: RgbImage, boxes: Vec<AbsoluteBox>) -> Self {
        Self { image, boxes }
    }
}

/// One randomized step of the pipeline.
///
/// The pipeline decides whether a step fires using [`Transform::probability`];
/// `apply` always transforms.
pub trait Transform {
    fn name(&self) -> &'static str;
    fn probability(&self) -> f64;
    fn apply(&self, sample: Sample, rng: &mut StdRng) -> Sample;
}

pub struct HorizontalFlip(pub FlipConfig);

impl Transform for HorizontalFlip {
    fn name(&self) -> &'static str {
        "horizontal_flip"
    }

    fn probability(&self) -> f64 {
        self.0.p
    }

    fn apply(&self, sample: Sample, _rng: &mut StdRng) -> Sample {
        let boxes = flip_boxes(&sample.boxes, sample.image.width());
        Sample::new(imageops::flip_horizontal(&sample.image), boxes)
    }
}

/// Mirror boxes about the vertical center line of an image `width` wide.
pub fn flip_boxes(boxes: &[AbsoluteBox], width: u32) -> Vec<AbsoluteBox> {
    let w = i64::from(width);
    boxes
        .iter()
        .map(|b| AbsoluteBox::new(w - b.x2, b.y1, w - b.x1, b.y2, b.class_id))
        .collect()
}

pub struct Rotate(pub RotateConfig);

impl Transform for Rotate {
    fn name(&self) -> &'static str {
        "rotate"
    }

    fn probability(&self) -> f64 {
        self.0.p
    }

    fn apply(&self, sample: Sample, rng: &mut StdRng) -> Sample {
        let limit = self.0.limit_deg;
        let degrees: f64 = rng.random_range(-limit..=limit);
        let theta = degrees.to_radians();

        let (width, height) = sample.image.dimensions();
        let image = rotate_about_center(
            &sample.image,
            theta as f32,
            Interpolation::Bilinear,
            Rgb([0u8, 0u8, 0u8]),
        );
        let boxes = rotate_boxes(&sample.boxes, theta, width, height);
        Sample::new(image, boxes)
    }
}

/// Rotate boxes clockwise by `theta` radians about the image center and
/// replace each with the axis-aligned rectangle around its rotated corners.
///
/// The result may extend past the image; callers clip afterwards.
pub fn rotate_boxes(
    boxes: &[AbsoluteBox],
    theta: f64,
    width: u32,
    height: u32,
) -> Vec<AbsoluteBox> {
    let cx = f64::from(width) / 2.0;
    let cy = f64::from(height) / 2.0;
    let (sin, cos) = theta.sin_cos();

    boxes
        .iter()
        .map(|b| {
            let mut min_x = f64::INFINITY;
            let mut min_y = f64::INFINITY;
            let mut max_x = f64::NEG_INFINITY;
            let mut max_y = f64::NEG_INFINITY;
            for (x, y) in b.corners() {
                let (dx, dy) = (x - cx, y - cy);
                let rx = cx + cos * dx - sin * dy;
                let ry = cy + sin * dx + cos * dy;
                min_x = min_x.min(rx);
                min_y = min_y.min(ry);
                max_x = max_x.max(rx);
                max_y = max_y.max(ry);
            }
            AbsoluteBox::from_corners_f64(min_x, min_y, max_x, max_y, b.class_id)
        })
        .collect()
}

pub struct BrightnessContrast(pub BrightnessContrastConfig);

impl Transform for BrightnessContrast {
    fn name(&self) -> &'static str {
        "brightness_contrast"
    }

    fn probability(&self) -> f64 {
        self.0.p
    }

    fn apply(&self, mut sample: Sample, rng: &mut StdRng) -> Sample {
        let c = self.0.contrast_limit;
        let b = self.0.brightness_limit;
        let alpha = 1.0 + rng.random_range(-c..=c);
        let beta = rng.random_range(-b..=b) * 255.0;

        for pixel in sample.image.pixels_mut() {
            for channel in pixel.0.iter_mut() {
                *channel = clamp_u8(f64::from(*channel) * alpha + beta);
            }
        }
        sample
    }
}

pub struct HueSaturationValue(pub HsvConfig);

impl Transform for HueSaturationValue {
    fn name(&self) -> &'static str {
        "hue_saturation_value"
    }

    fn probability(&self) -> f64 {
        self.0.p
    }

    fn apply(&self, mut sample: Sample, rng: &mut StdRng) -> Sample {
        let cfg = &self.0;
        let hue_shift = rng.random_range(-cfg.hue_shift_deg..=cfg.hue_shift_deg);
        let sat_shift = rng.random_range(-cfg.sat_shift..=cfg.sat_shift) / 255.0;
        let val_shift = rng.random_range(-cfg.val_shift..=cfg.val_shift) / 255.0;

        for pixel in sample.image.pixels_mut() {
            let [r, g, b] = pixel.0;
            let (h, s, v) = rgb_to_hsv(r, g, b);
            let h = (h + hue_shift).rem_euclid(360.0);
            let s = (s + sat_shift).clamp(0.0, 1.0);
            let v = (v + val_shift).clamp(0.0, 1.0);
            pixel.0 = hsv_to_rgb(h, s, v);
        }
        sample
    }
}

/// Hue in degrees, saturation and value in `[0, 1]`.
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    (hue, saturation, max)
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [u8; 3] {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [
        clamp_u8((r + m) * 255.0),
        clamp_u8((g + m) * 255.0),
        clamp_u8((b + m) * 255.0),
    ]
}

pub struct GaussianNoise(pub NoiseConfig);

impl Transform for GaussianNoise {
    fn name(&self) -> &'static str {
        "gaussian_noise"
    }

    fn probability(&self) -> f64 {
        self.0.p
    }

    fn apply(&self, sample: Sample, rng: &mut StdRng) -> Sample {
        let variance = rng.random_range(self.0.var_min..=self.0.var_max);
        let seed: u64 = rng.random();
        let image = gaussian_noise(&sample.image, 0.0, variance.sqrt(), seed);
        Sample::new(image, sample.boxes)
    }
}

pub struct MotionBlur(pub MotionBlurConfig);

impl Transform for MotionBlur {
    fn name(&self) -> &'static str {
        "motion_blur"
    }

    fn probability(&self) -> f64 {
        self.0.p
    }

    fn apply(&self, sample: Sample, rng: &mut StdRng) -> Sample {
        let kernels: Vec<u32> = (3..=self.0.max_kernel.max(3)).step_by(2).collect();
        let length = kernels[rng.random_range(0..kernels.len())];
        let angle: f64 = rng.random_range(0.0..=std::f64::consts::PI);
        let image = motion_blur(&sample.image, length, angle);
        Sample::new(image, sample.boxes)
    }
}

/// Average each pixel along a line of `length` pixels at `angle` radians.
fn motion_blur(image: &RgbImage, length: u32, angle: f64) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let half = (length / 2) as i64;
    let (sin, cos) = angle.sin_cos();
    let offsets: Vec<(i64, i64)> = (-half..=half)
        .map(|t| {
            (
                (t as f64 * cos).round() as i64,
                (t as f64 * sin).round() as i64,
            )
        })
        .collect();
    let taps = offsets.len() as f64;
    let max_x = i64::from(width) - 1;
    let max_y = i64::from(height) - 1;

    RgbImage::from_fn(width, height, |x, y| {
        let mut sum = [0.0f64; 3];
        for (dx, dy) in &offsets {
            let sx = (i64::from(x) + dx).clamp(0, max_x) as u32;
            let sy = (i64::from(y) + dy).clamp(0, max_y) as u32;
            let p = image.get_pixel(sx, sy);
            for (acc, value) in sum.iter_mut().zip(p.0) {
                *acc += f64::from(value);
            }
        }
        Rgb([
            clamp_u8(sum[0] / taps),
            clamp_u8(sum[1] / taps),
            clamp_u8(sum[2] / taps),
        ])
    })
}

pub struct CoarseDropout(pub DropoutConfig);

impl Transform for CoarseDropout {
    fn name(&self) -> &'static str {
        "coarse_dropout"
    }

    fn probability(&self) -> f64 {
        self.0.p
    }

    fn apply(&self, mut sample: Sample, rng: &mut StdRng) -> Sample {
        let cfg = &self.0;
        let (width, height) = sample.image.dimensions();
        let fill = Rgb([cfg.fill; 3]);

        let holes = rng.random_range(cfg.min_holes..=cfg.max_holes);
        for _ in 0..holes {
            let hole_w = rng.random_range(cfg.min_size..=cfg.max_size).min(width);
            let hole_h = rng.random_range(cfg.min_size..=cfg.max_size).min(height);
            if hole_w == 0 || hole_h == 0 {
                continue;
            }
            let x = rng.random_range(0..=width - hole_w);
            let y = rng.random_range(0..=height - hole_h);
            draw_filled_rect_mut(
                &mut sample.image,
                Rect::at(x as i32, y as i32).of_size(hole_w, hole_h),
                fill,
            );
        }
        sample
    }
}

fn clamp_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
