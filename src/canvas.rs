//! Paint-surface sizing and stroke styling.
//!
//! The drawing surface is sized to a display budget, not to the image. Strokes
//! are therefore captured at a reduced resolution and resampled back up during
//! fusion.
//!
//! A paint canvas written to disk has no alpha channel. Strokes on it are found
//! by the stroke color, which the background is guaranteed never to contain.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, RgbaImage};

/// Default maximum display width of the paint surface, in pixels.
pub const DEFAULT_MAX_DISPLAY_WIDTH: u32 = 700;

/// Gray shown where the cutout is transparent.
pub const CANVAS_MATTE: u8 = 128;

/// Resolution of the paint surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
}

impl CanvasSize {
    /// Fit an image of `width` x `height` into `max_width`, keeping aspect ratio.
    ///
    /// Images already narrower than the cap keep their native size. A cap of
    /// zero disables scaling.
    #[must_use]
    pub fn fit(width: u32, height: u32, max_width: u32) -> Self {
        if max_width == 0 || width <= max_width {
            return Self { width, height };
        }
        let scaled = (u64::from(height) * u64::from(max_width) + u64::from(width) / 2)
            / u64::from(width);
        #[allow(clippy::cast_possible_truncation)]
        let scaled = (scaled as u32).max(1);
        Self {
            width: max_width,
            height: scaled,
        }
    }

    /// Whether the surface is smaller than the image it displays.
    #[must_use]
    pub fn is_downscaled(&self, image_width: u32, image_height: u32) -> bool {
        (self.width, self.height) != (image_width, image_height)
    }
}

/// Pen appearance handed to the drawing widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeStyle {
    /// Stroke color.
    pub color: Rgb<u8>,
    /// Stroke width in canvas pixels.
    pub width: u32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Rgb([0, 255, 0]),
            width: 20,
        }
    }
}

/// Scale `image` to `size` for display under the pen.
///
/// Uses a smooth filter; the result is for viewing only and never feeds fusion.
#[must_use]
pub fn canvas_background(image: &RgbaImage, size: CanvasSize) -> RgbaImage {
    if image.dimensions() == (size.width, size.height) {
        return image.clone();
    }
    imageops::resize(image, size.width, size.height, FilterType::Triangle)
}

/// Flatten a cutout onto [`CANVAS_MATTE`] at `size`, ready to be painted on.
///
/// The result has no alpha. Any background pixel that happens to equal the
/// stroke color is nudged by one level so that only real strokes match it.
#[must_use]
pub fn paint_canvas(image: &RgbaImage, size: CanvasSize, stroke: &StrokeStyle) -> RgbImage {
    let scaled = canvas_background(image, size);
    let matte = u32::from(CANVAS_MATTE);
    RgbImage::from_fn(scaled.width(), scaled.height(), |x, y| {
        let p = scaled.get_pixel(x, y);
        let a = u32::from(p[3]);
        let mut px = Rgb([0; 3]);
        for c in 0..3 {
            let v = (u32::from(p[c]) * a + matte * (255 - a) + 127) / 255;
            #[allow(clippy::cast_possible_truncation)]
            {
                px[c] = v as u8;
            }
        }
        if px == stroke.color {
            px[0] ^= 1;
        }
        px
    })
}

/// Parse a `#RRGGBB` or `RRGGBB` hex color.
#[must_use]
pub fn parse_hex_color(s: &str) -> Option<Rgb<u8>> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}
