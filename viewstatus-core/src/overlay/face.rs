use std::fmt;
use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};
use once_cell::sync::Lazy;
use tracing::{debug, warn};

use super::bitmap;
use crate::error::{Result, ViewStatusError};

static SYSTEM_FONT_CANDIDATES: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/Library/Fonts/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
});

/// A rasterised glyph positioned relative to the pen and baseline.
#[derive(Debug, Clone)]
pub struct RasterGlyph {
    pub width: u32,
    pub height: u32,
    /// Offset from the pen position to the left edge.
    pub left: i32,
    /// Distance from the baseline up to the top edge.
    pub top: i32,
    pub advance: f32,
    /// Row-major 8-bit coverage, `width * height` long.
    pub coverage: Vec<u8>,
}

/// Typeface used to draw captions.
pub enum CaptionFace {
    TrueType(Box<Font>),
    Bitmap,
}

impl fmt::Debug for CaptionFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptionFace::TrueType(_) => f.write_str("CaptionFace::TrueType"),
            CaptionFace::Bitmap => f.write_str("CaptionFace::Bitmap"),
        }
    }
}

impl CaptionFace {
    /// Load the configured font, else the first usable system font, else
    /// fall back to the built-in bitmap face.
    pub fn load(font_path: Option<&Path>) -> Self {
        if let Some(path) = font_path {
            match Self::from_file(path) {
                Ok(face) => return face,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "configured caption font unusable")
                }
            }
        }

        for candidate in SYSTEM_FONT_CANDIDATES.iter() {
            if !candidate.exists() {
                continue;
            }
            match Self::from_file(candidate) {
                Ok(face) => {
                    debug!(path = %candidate.display(), "using system caption font");
                    return face;
                }
                Err(err) => {
                    debug!(path = %candidate.display(), error = %err, "skipping system font")
                }
            }
        }

        debug!("no TrueType font available, using built-in bitmap face");
        CaptionFace::Bitmap
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|err| {
            ViewStatusError::Font(format!("{}: {err}", path.display()))
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| ViewStatusError::Font(e.to_string()))?;
        Ok(CaptionFace::TrueType(Box::new(font)))
    }

    pub fn is_bitmap(&self) -> bool {
        matches!(self, CaptionFace::Bitmap)
    }

    pub fn rasterize(&self, c: char, px: f32) -> RasterGlyph {
        match self {
            CaptionFace::TrueType(font) => {
                let (metrics, coverage) = font.rasterize(c, px);
                RasterGlyph {
                    width: metrics.width as u32,
                    height: metrics.height as u32,
                    left: metrics.xmin,
                    top: metrics.ymin + metrics.height as i32,
                    advance: metrics.advance_width,
                    coverage,
                }
            }
            CaptionFace::Bitmap => {
                let scale = bitmap_scale(px);
                RasterGlyph {
                    width: bitmap::CELL_WIDTH * scale,
                    height: bitmap::CELL_HEIGHT * scale,
                    left: 0,
                    top: (bitmap::CELL_HEIGHT * scale) as i32,
                    advance: (bitmap::ADVANCE * scale) as f32,
                    coverage: bitmap::coverage(c, scale),
                }
            }
        }
    }

    /// Total advance of `text` at `px`.
    pub fn measure(&self, text: &str, px: f32) -> f32 {
        text.chars().map(|c| self.rasterize(c, px).advance).sum()
    }
}

fn bitmap_scale(px: f32) -> u32 {
    ((px / 9.0).round() as u32).max(1)
}
