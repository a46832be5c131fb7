//! Burns a "viewed" caption onto thumbnail images.
//!
//! Rendering is a pure function of the input bytes and the watch state: the
//! source image is decoded, a translucent bar and the caption are drawn on a
//! copy, and the copy is re-encoded in the source format. Nothing is shared
//! between calls, so the renderer can be used from any thread.

mod bitmap;
mod face;

use std::io::Cursor;

use image::{
    DynamicImage, ImageFormat, Rgba, RgbaImage, codecs::jpeg::JpegEncoder,
};
use tracing::{debug, warn};
use viewstatus_model::{Caption, WatchState};

use crate::config::OverlayConfig;
use crate::error::{Result, ViewStatusError};

pub use face::{CaptionFace, RasterGlyph};

const MIN_BAR_HEIGHT: u32 = 12;
const MIN_FONT_PX: f32 = 8.0;

/// Result of one overlay request.
#[derive(Debug)]
pub enum OverlayOutcome {
    /// No thumbnail was supplied.
    Absent,
    /// Nothing to draw; the input bytes are returned as they were.
    Untouched(Vec<u8>),
    /// Caption drawn and image re-encoded.
    Overlaid { bytes: Vec<u8>, caption: Caption },
    /// Decoding or encoding failed; carries the input bytes unchanged.
    Failed {
        original: Vec<u8>,
        error: ViewStatusError,
    },
}

impl OverlayOutcome {
    /// Bytes to hand back to the host.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            OverlayOutcome::Absent => None,
            OverlayOutcome::Untouched(bytes)
            | OverlayOutcome::Overlaid { bytes, .. }
            | OverlayOutcome::Failed {
                original: bytes, ..
            } => Some(bytes),
        }
    }

    pub fn is_overlaid(&self) -> bool {
        matches!(self, OverlayOutcome::Overlaid { .. })
    }
}

/// Draws watch-status captions onto thumbnails.
#[derive(Debug)]
pub struct ThumbnailOverlayRenderer {
    config: OverlayConfig,
    face: CaptionFace,
}

impl ThumbnailOverlayRenderer {
    /// Build a renderer, resolving the caption font from the config.
    pub fn new(config: OverlayConfig) -> Self {
        let face = CaptionFace::load(config.font_path.as_deref());
        Self { config, face }
    }

    pub fn with_face(config: OverlayConfig, face: CaptionFace) -> Self {
        Self { config, face }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Overlay the caption for `state` onto `thumbnail`.
    ///
    /// Must be given the host's pristine thumbnail; feeding back a previous
    /// output would draw a second caption over the first.
    pub fn render(
        &self,
        thumbnail: Option<&[u8]>,
        state: WatchState,
    ) -> OverlayOutcome {
        let Some(bytes) = thumbnail else {
            return OverlayOutcome::Absent;
        };
        let Some(caption) = state.caption() else {
            return OverlayOutcome::Untouched(bytes.to_vec());
        };

        match self.render_caption(bytes, &caption.to_string()) {
            Ok(rendered) => {
                debug!(%caption, bytes = rendered.len(), "thumbnail overlaid");
                OverlayOutcome::Overlaid {
                    bytes: rendered,
                    caption,
                }
            }
            Err(error) => {
                warn!(%error, "failed to overlay thumbnail, passing it through");
                OverlayOutcome::Failed {
                    original: bytes.to_vec(),
                    error,
                }
            }
        }
    }

    /// Decode, draw `text`, and re-encode in the source format.
    pub fn render_caption(&self, bytes: &[u8], text: &str) -> Result<Vec<u8>> {
        let format = image::guess_format(bytes)?;
        let source = image::load_from_memory_with_format(bytes, format)?;
        let has_alpha = source.color().has_alpha();

        let mut canvas = source.to_rgba8();
        self.draw_caption(&mut canvas, text);

        let output = if has_alpha {
            DynamicImage::ImageRgba8(canvas)
        } else {
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
        };
        self.encode(&output, format)
    }

    /// Draw the bar and centred caption onto `canvas` in place.
    pub fn draw_caption(&self, canvas: &mut RgbaImage, text: &str) {
        let (width, height) = canvas.dimensions();
        if width == 0 || height == 0 {
            return;
        }

        let scale = self.config.scale_for(height);
        let bar_height = ((self.config.bar_height as f32 * scale).round()
            as u32)
            .max(MIN_BAR_HEIGHT)
            .min(height);
        let bar_top = height - bar_height;

        let [r, g, b, a] = self.config.bar_color;
        for y in bar_top..height {
            for x in 0..width {
                blend(canvas, x, y, [r, g, b], a);
            }
        }

        let px = (self.config.font_size * scale).max(MIN_FONT_PX);
        let text_width = self.face.measure(text, px);
        let baseline_offset =
            (self.config.baseline_offset as f32 * scale).round() as i64;
        let baseline = i64::from(height) - baseline_offset;
        let mut pen_x = ((width as f32 - text_width) / 2.0).max(0.0);

        for c in text.chars() {
            let glyph = self.face.rasterize(c, px);
            let origin_x = pen_x.round() as i64 + i64::from(glyph.left);
            let origin_y = baseline - i64::from(glyph.top);
            self.draw_glyph(canvas, &glyph, origin_x, origin_y, bar_top);
            pen_x += glyph.advance;
        }
    }

    fn draw_glyph(
        &self,
        canvas: &mut RgbaImage,
        glyph: &RasterGlyph,
        origin_x: i64,
        origin_y: i64,
        bar_top: u32,
    ) {
        let (width, height) = canvas.dimensions();
        for gy in 0..glyph.height {
            let y = origin_y + i64::from(gy);
            // Text stays inside the caption band.
            if y < i64::from(bar_top) || y >= i64::from(height) {
                continue;
            }
            for gx in 0..glyph.width {
                let x = origin_x + i64::from(gx);
                if x < 0 || x >= i64::from(width) {
                    continue;
                }
                let coverage =
                    glyph.coverage[(gy * glyph.width + gx) as usize];
                if coverage > 0 {
                    blend(
                        canvas,
                        x as u32,
                        y as u32,
                        self.config.text_color,
                        coverage,
                    );
                }
            }
        }
    }

    fn encode(&self, image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        match format {
            ImageFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(
                    &mut out,
                    self.config.jpeg_quality,
                );
                DynamicImage::ImageRgb8(image.to_rgb8())
                    .write_with_encoder(encoder)?;
            }
            other => image.write_to(&mut out, other)?,
        }
        Ok(out.into_inner())
    }
}

/// Source-over blend of an opaque colour at `alpha` onto one pixel.
fn blend(canvas: &mut RgbaImage, x: u32, y: u32, color: [u8; 3], alpha: u8) {
    let Rgba([r, g, b, a]) = *canvas.get_pixel(x, y);
    let mix = |dst: u8, src: u8| -> u8 {
        let alpha = u32::from(alpha);
        ((u32::from(src) * alpha + u32::from(dst) * (255 - alpha) + 127) / 255)
            as u8
    };
    let out_a = a.max(alpha);
    canvas.put_pixel(
        x,
        y,
        Rgba([mix(r, color[0]), mix(g, color[1]), mix(b, color[2]), out_a]),
    );
}
