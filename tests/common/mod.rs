#![allow(dead_code)]

use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};

/// Write a small gradient image; the format follows the extension.
pub fn write_image(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
    .save(path)
    .expect("write image file");
}

pub fn write_label(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, content).expect("write label file");
}

pub fn write_detections(dir: &Path, stem: &str, json: &str) {
    fs::create_dir_all(dir).expect("create detections dir");
    fs::write(dir.join(format!("{stem}.json")), json).expect("write detections");
}

pub fn write_classes(path: &Path, names: &[&str]) {
    let mut yaml = String::from("names:\n");
    for name in names {
        yaml.push_str(&format!("  - {name}\n"));
    }
    fs::write(path, yaml).expect("write class schema");
}

/// Sorted file names directly inside `dir`; empty if it does not exist.
pub fn file_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|entry| {
            entry
                .expect("read dir entry")
                .file_name()
                .to_string_lossy()
                .to_string()
        })
        .collect();
    names.sort();
    names
}
