//! Mask fusion: merge a machine alpha with a painted correction mask.
//!
//! The segmentation step produces an alpha channel that approximates the
//! foreground. The user then paints over regions the model dropped. Fusion
//! resamples that paint mask to the segmentation's native resolution and takes
//! the pixel-wise maximum:
//!
//! `fused = max(segmented_alpha, nearest(correction_mask))`
//!
//! The result replaces the alpha channel of the original, unsegmented image, so
//! painting can only ever add opacity and the color data is never touched.

use image::{GrayImage, Luma, RgbaImage};
use tracing::debug;

use crate::error::{Error, Result};

/// Map a destination index to its nearest source index (pixel-center convention).
///
/// Computes `floor((dst + 0.5) * src_len / dst_len)` in integer arithmetic, so an
/// integer upscale is exact block replication.
fn nearest_index(dst: u32, src_len: u32, dst_len: u32) -> u32 {
    let idx = (2 * u64::from(dst) + 1) * u64::from(src_len) / (2 * u64::from(dst_len));
    #[allow(clippy::cast_possible_truncation)]
    let idx = idx as u32;
    idx.min(src_len - 1)
}

/// Resample a mask to `width` x `height` with nearest-neighbor interpolation.
///
/// Every output pixel copies exactly one source pixel, so a mask holding only
/// 0 and 255 stays binary. A same-size request returns an identical copy.
///
/// # Errors
///
/// Returns [`Error::EmptyMask`] if the source mask has zero width or height.
pub fn resize_nearest(mask: &GrayImage, width: u32, height: u32) -> Result<GrayImage> {
    let (src_w, src_h) = mask.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(Error::EmptyMask {
            width: src_w,
            height: src_h,
        });
    }

    if (src_w, src_h) == (width, height) {
        debug!(width, height, "correction mask already at target size");
        return Ok(mask.clone());
    }

    debug!(src_w, src_h, width, height, "resampling correction mask");

    let cols: Vec<u32> = (0..width)
        .map(|x| nearest_index(x, src_w, width))
        .collect();

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        let sy = nearest_index(y, src_h, height);
        for (x, &sx) in cols.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            out.put_pixel(x as u32, y, *mask.get_pixel(sx, sy));
        }
    }
    Ok(out)
}

/// Pull the alpha channel out of an RGBA image as a grayscale buffer.
#[must_use]
pub fn extract_alpha(image: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([image.get_pixel(x, y)[3]])
    })
}

/// Fuse a segmentation alpha with a correction mask.
///
/// The mask is resampled to the alpha's resolution, then each output pixel is
/// `max(alpha, mask)`. An all-zero mask returns the alpha unchanged.
///
/// # Errors
///
/// Returns [`Error::EmptyMask`] if the correction mask has zero width or height.
pub fn fuse_alpha(segmented_alpha: &GrayImage, correction_mask: &GrayImage) -> Result<GrayImage> {
    let (width, height) = segmented_alpha.dimensions();
    let resampled = resize_nearest(correction_mask, width, height)?;

    let mut fused = segmented_alpha.clone();
    for (dst, &painted) in fused.iter_mut().zip(resampled.iter()) {
        *dst = (*dst).max(painted);
    }
    Ok(fused)
}

/// Build a new RGBA image from `original`'s color channels and `alpha`.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if `alpha` is not the size of `original`.
pub fn apply_alpha(original: &RgbaImage, alpha: &GrayImage) -> Result<RgbaImage> {
    if original.dimensions() != alpha.dimensions() {
        return Err(Error::DimensionMismatch {
            expected_w: original.width(),
            expected_h: original.height(),
            actual_w: alpha.width(),
            actual_h: alpha.height(),
        });
    }

    let mut out = original.clone();
    for (px, a) in out.pixels_mut().zip(alpha.pixels()) {
        px[3] = a[0];
    }
    Ok(out)
}

/// Produce the final retouched image.
///
/// Resamples `correction_mask` to the resolution of `segmented_alpha`, fuses the
/// two with a pixel-wise maximum, and applies the result to the color data of
/// `original`. The segmented image's own RGB is never used.
///
/// # Errors
///
/// Returns [`Error::EmptyMask`] for a zero-sized mask, or
/// [`Error::DimensionMismatch`] if the segmentation does not match the original's
/// resolution.
pub fn fuse(
    original: &RgbaImage,
    segmented_alpha: &GrayImage,
    correction_mask: &GrayImage,
) -> Result<RgbaImage> {
    let fused = fuse_alpha(segmented_alpha, correction_mask)?;
    apply_alpha(original, &fused)
}
