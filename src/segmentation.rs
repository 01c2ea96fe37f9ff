//! Seam for the external segmentation service.
//!
//! The model itself lives outside this crate. A [`Segmenter`] takes encoded
//! image bytes and returns encoded RGBA bytes whose alpha approximates the
//! foreground.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Refinement knobs forwarded to the segmentation service untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefineParams {
    /// Ask the service to run alpha matting on the trimap edge.
    pub alpha_matting: bool,
    /// Confidence above which a pixel is definitely foreground.
    pub foreground_threshold: u8,
    /// Confidence below which a pixel is definitely background.
    pub background_threshold: u8,
    /// Erosion applied to the trimap before matting.
    pub erode_size: u32,
}

impl Default for RefineParams {
    fn default() -> Self {
        Self {
            alpha_matting: false,
            foreground_threshold: 240,
            background_threshold: 10,
            erode_size: 10,
        }
    }
}

/// A foreground/background segmentation backend.
pub trait Segmenter {
    /// Segment `encoded` and return an encoded RGBA cutout.
    ///
    /// # Errors
    ///
    /// Implementations return [`Error::Segmentation`] when the service is
    /// unreachable or rejects the input.
    fn segment(&self, encoded: &[u8], params: &RefineParams) -> Result<Vec<u8>>;
}

impl<F> Segmenter for F
where
    F: Fn(&[u8], &RefineParams) -> Result<Vec<u8>>,
{
    fn segment(&self, encoded: &[u8], params: &RefineParams) -> Result<Vec<u8>> {
        self(encoded, params)
    }
}

/// Serves a cutout that an external tool already wrote to disk.
///
/// Input bytes and refinement parameters are ignored.
#[derive(Debug, Clone)]
pub struct PrecomputedSegmenter {
    path: PathBuf,
}

impl PrecomputedSegmenter {
    /// Serve the cutout stored at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the stored cutout.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Segmenter for PrecomputedSegmenter {
    fn segment(&self, _encoded: &[u8], _params: &RefineParams) -> Result<Vec<u8>> {
        std::fs::read(&self.path)
            .map_err(|e| Error::Segmentation(format!("{}: {e}", self.path.display())))
    }
}
