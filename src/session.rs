//! Per-user editing session.
//!
//! A [`Session`] owns at most one original, one segmented, and one final image.
//! Each is replaced wholesale by the action that produces it and never mutated
//! in place. Every failure leaves the session usable so the user can retry.

use std::borrow::Cow;
use std::path::Path;

use image::RgbaImage;
use tracing::{info, warn};

use crate::canvas::{self, CanvasSize};
use crate::engine::encode_png;
use crate::error::{Error, Result};
use crate::fusion;
use crate::mask::CorrectionMask;
use crate::segmentation::{RefineParams, Segmenter};

/// What an apply request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A final image was rebuilt from the fused alpha.
    Applied {
        /// Painted pixels in the correction mask, at mask resolution.
        painted_pixels: usize,
    },
    /// No mask was supplied; nothing was fused.
    NoMask,
}

/// State of one image being retouched.
#[derive(Debug, Default)]
pub struct Session {
    name: Option<String>,
    original: Option<RgbaImage>,
    segmented: Option<RgbaImage>,
    final_image: Option<RgbaImage>,
}

impl Session {
    /// Start an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every image held by the session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Replace the original image with freshly uploaded bytes.
    ///
    /// Any previous segmentation and final image belong to the old upload and
    /// are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] for unreadable bytes; the session is left empty.
    pub fn upload(&mut self, bytes: &[u8], name: &str) -> Result<()> {
        self.reset();
        let image = match image::load_from_memory(bytes) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                warn!(name, error = %e, "upload could not be decoded");
                return Err(Error::Decode(e));
            }
        };
        info!(name, width = image.width(), height = image.height(), "image uploaded");
        self.name = Some(name.to_string());
        self.original = Some(image);
        Ok(())
    }

    /// Run the external segmenter on the original image.
    ///
    /// On success the segmented image is replaced and any stale final image is
    /// cleared. On failure nothing in the session changes.
    ///
    /// # Errors
    ///
    /// - [`Error::NoOriginal`] if nothing has been uploaded.
    /// - [`Error::Segmentation`] if the service fails or returns unreadable bytes.
    /// - [`Error::DimensionMismatch`] if the cutout is not the original's size.
    pub fn run_segmentation(
        &mut self,
        segmenter: &dyn Segmenter,
        params: &RefineParams,
    ) -> Result<()> {
        let original = self.original.as_ref().ok_or(Error::NoOriginal)?;
        let encoded = encode_png(original)?;

        let cutout = segmenter.segment(&encoded, params).inspect_err(|e| {
            warn!(error = %e, "segmentation failed, keeping previous state");
        })?;
        let cutout = image::load_from_memory(&cutout)
            .map_err(|e| Error::Segmentation(format!("unreadable cutout: {e}")))?
            .to_rgba8();

        if cutout.dimensions() != original.dimensions() {
            return Err(Error::DimensionMismatch {
                expected_w: original.width(),
                expected_h: original.height(),
                actual_w: cutout.width(),
                actual_h: cutout.height(),
            });
        }

        info!(
            width = cutout.width(),
            height = cutout.height(),
            "segmentation complete"
        );
        self.segmented = Some(cutout);
        self.final_image = None;
        Ok(())
    }

    /// Fuse the correction mask into the segmentation and rebuild the final image.
    ///
    /// A missing mask is a no-op reported as [`ApplyOutcome::NoMask`].
    ///
    /// # Errors
    ///
    /// - [`Error::NoOriginal`] if nothing has been uploaded.
    /// - [`Error::NotSegmented`] if segmentation has not run.
    pub fn apply_correction(&mut self, mask: Option<&CorrectionMask>) -> Result<ApplyOutcome> {
        let Some(mask) = mask else {
            warn!("no correction mask supplied, nothing to apply");
            return Ok(ApplyOutcome::NoMask);
        };
        let original = self.original.as_ref().ok_or(Error::NoOriginal)?;
        let segmented = self.segmented.as_ref().ok_or(Error::NotSegmented)?;

        let alpha = fusion::extract_alpha(segmented);
        let retouched = fusion::fuse(original, &alpha, mask.as_luma())?;

        let painted_pixels = mask.painted_pixels();
        let (mask_w, mask_h) = mask.dimensions();
        info!(mask_w, mask_h, painted_pixels, "correction applied");

        self.final_image = Some(retouched);
        Ok(ApplyOutcome::Applied { painted_pixels })
    }

    /// Paint-surface size for the current image under a display width cap.
    #[must_use]
    pub fn canvas_size(&self, max_width: u32) -> Option<CanvasSize> {
        let image = self.segmented.as_ref().or(self.original.as_ref())?;
        Some(CanvasSize::fit(image.width(), image.height(), max_width))
    }

    /// Segmented image scaled to the paint surface, for display under the pen.
    #[must_use]
    pub fn canvas_background(&self, max_width: u32) -> Option<RgbaImage> {
        let segmented = self.segmented.as_ref()?;
        let size = CanvasSize::fit(segmented.width(), segmented.height(), max_width);
        Some(canvas::canvas_background(segmented, size))
    }

    /// Lossless PNG bytes of the final image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoFinalImage`] before the first successful apply.
    pub fn final_png(&self) -> Result<Vec<u8>> {
        let image = self.final_image.as_ref().ok_or(Error::NoFinalImage)?;
        encode_png(image)
    }

    /// Suggested file name for the download, e.g. `photo_retouched.png`.
    #[must_use]
    pub fn download_name(&self) -> String {
        let stem = self
            .name
            .as_deref()
            .and_then(|n| Path::new(n).file_stem())
            .map_or(Cow::Borrowed("image"), |s| s.to_string_lossy());
        format!("{stem}_retouched.png")
    }

    /// Uploaded file name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The uploaded image.
    #[must_use]
    pub fn original(&self) -> Option<&RgbaImage> {
        self.original.as_ref()
    }

    /// The latest segmentation result.
    #[must_use]
    pub fn segmented(&self) -> Option<&RgbaImage> {
        self.segmented.as_ref()
    }

    /// The latest retouched image.
    #[must_use]
    pub fn final_image(&self) -> Option<&RgbaImage> {
        self.final_image.as_ref()
    }
}
