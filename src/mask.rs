//! User-painted correction masks.
//!
//! A drawing surface hands back a rasterized overlay whose alpha channel is
//! non-zero wherever the pen touched. That overlay is reduced here to a binary
//! mask: 255 where painted, 0 elsewhere.
//!
//! Masks painted directly onto an exported canvas carry no alpha. There the
//! strokes are recognized by their exact color instead.

use std::path::Path;

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, RgbaImage};

use crate::error::{Error, Result};

/// Intensity written for painted pixels.
pub const PAINTED: u8 = 255;

/// How a mask file encodes the user's strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskSource {
    /// A separate stroke layer: alpha above zero, or luminance above zero for
    /// opaque files.
    #[default]
    Layer,
    /// An exported paint canvas with strokes drawn in the given color.
    Canvas(Rgb<u8>),
}

/// A binary (0/255) mask of pixels the user forced opaque.
///
/// Always non-empty: construction rejects zero-sized input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionMask {
    mask: GrayImage,
}

impl CorrectionMask {
    fn new(mask: GrayImage) -> Result<Self> {
        let (width, height) = mask.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::EmptyMask { width, height });
        }
        Ok(Self { mask })
    }

    /// A mask of the given size with nothing painted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyMask`] if either dimension is zero.
    pub fn blank(width: u32, height: u32) -> Result<Self> {
        Self::new(GrayImage::new(width, height))
    }

    /// Read a drawing overlay: any pixel with alpha above zero counts as painted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyMask`] if the overlay has zero width or height.
    pub fn from_overlay(overlay: &RgbaImage) -> Result<Self> {
        let mask = GrayImage::from_fn(overlay.width(), overlay.height(), |x, y| {
            Luma([if overlay.get_pixel(x, y)[3] > 0 { PAINTED } else { 0 }])
        });
        Self::new(mask)
    }

    /// Binarize a grayscale mask: any non-zero intensity counts as painted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyMask`] if the mask has zero width or height.
    pub fn from_luma(mut mask: GrayImage) -> Result<Self> {
        for v in mask.iter_mut() {
            if *v > 0 {
                *v = PAINTED;
            }
        }
        Self::new(mask)
    }

    /// Read strokes drawn in `ink` on a flattened paint canvas.
    ///
    /// Only pixels exactly equal to `ink` count as painted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyMask`] if the canvas has zero width or height.
    pub fn from_strokes(canvas: &RgbImage, ink: Rgb<u8>) -> Result<Self> {
        let mask = GrayImage::from_fn(canvas.width(), canvas.height(), |x, y| {
            Luma([if *canvas.get_pixel(x, y) == ink { PAINTED } else { 0 }])
        });
        Self::new(mask)
    }

    /// Interpret a decoded image as a mask.
    ///
    /// Images that carry an alpha channel are read as drawing overlays; opaque
    /// formats are read by luminance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyMask`] if the image has zero width or height.
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self> {
        if image.color().has_alpha() {
            Self::from_overlay(&image.to_rgba8())
        } else {
            Self::from_luma(image.to_luma8())
        }
    }

    /// Decode a mask from encoded image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the bytes are not a readable image.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes).map_err(Error::Decode)?;
        Self::from_dynamic(&image)
    }

    /// Load a stroke-layer mask from an image file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, or [`Error::Decode`]
    /// if it is not an image.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_as(path, MaskSource::Layer)
    }

    /// Load a mask from an image file, reading strokes as `source` describes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, or [`Error::Decode`]
    /// if it is not an image.
    pub fn load_as(path: &Path, source: MaskSource) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let image = image::load_from_memory(&bytes).map_err(Error::Decode)?;
        match source {
            MaskSource::Layer => Self::from_dynamic(&image),
            MaskSource::Canvas(ink) => Self::from_strokes(&image.to_rgb8(), ink),
        }
    }

    /// Mask resolution as `(width, height)`.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.mask.dimensions()
    }

    /// Number of painted pixels.
    #[must_use]
    pub fn painted_pixels(&self) -> usize {
        self.mask.iter().filter(|&&v| v == PAINTED).count()
    }

    /// True when the user drew nothing.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.mask.iter().all(|&v| v == 0)
    }

    /// Borrow the underlying grayscale buffer.
    #[must_use]
    pub fn as_luma(&self) -> &GrayImage {
        &self.mask
    }
}
