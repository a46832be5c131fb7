#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;
use viewstatus_model::ResourceKey;

/// A temporary media directory.
pub struct MediaDir {
    dir: TempDir,
}

impl MediaDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp media dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn media(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn key(&self, name: &str) -> ResourceKey {
        ResourceKey::new(self.dir.path(), name).expect("valid resource key")
    }

    pub fn record_text(&self) -> Option<String> {
        std::fs::read_to_string(self.dir.path().join(".viewstatus")).ok()
    }

    pub fn write_record(&self, text: &str) {
        std::fs::write(self.dir.path().join(".viewstatus"), text)
            .expect("write record");
    }
}

/// Flat grey thumbnail encoded in `format`.
pub fn thumbnail(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([96, 120, 144]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, format)
        .expect("encode thumbnail");
    out.into_inner()
}
