//! Error types for the bg-retouch crate.

/// Errors that can occur while segmenting, correcting, or saving an image.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Uploaded or loaded bytes could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),

    /// A correction mask with zero width or height was supplied.
    #[error("correction mask is empty ({width}x{height})")]
    EmptyMask {
        /// Mask width in pixels.
        width: u32,
        /// Mask height in pixels.
        height: u32,
    },

    /// Two buffers that must share a resolution do not.
    #[error("dimension mismatch: expected {expected_w}x{expected_h}, got {actual_w}x{actual_h}")]
    DimensionMismatch {
        /// Required width.
        expected_w: u32,
        /// Required height.
        expected_h: u32,
        /// Width actually supplied.
        actual_w: u32,
        /// Height actually supplied.
        actual_h: u32,
    },

    /// An operation needed an uploaded original image and there is none.
    #[error("no original image has been uploaded")]
    NoOriginal,

    /// Fusion was requested before segmentation produced a result.
    #[error("segmentation has not been run for this image")]
    NotSegmented,

    /// A download was requested before any correction was applied.
    #[error("no retouched image is available yet")]
    NoFinalImage,

    /// The external segmentation service failed.
    #[error("segmentation failed: {0}")]
    Segmentation(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The output format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image processing (encode, save).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
