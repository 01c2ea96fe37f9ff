//! Touch up machine background removal with a painted correction mask.
//!
//! An external segmentation model cuts the subject out of a photo, but it
//! routinely drops hair, hands, or props. This crate lets the user paint those
//! regions back: the painted mask is resampled to the cutout's resolution with
//! nearest-neighbor interpolation, merged with the cutout's alpha by a
//! pixel-wise maximum, and applied to the untouched original colors.
//!
//! # Quick Start
//!
//! ```no_run
//! use bg_retouch::{fusion, CorrectionMask};
//!
//! let original = image::open("photo.jpg").unwrap().to_rgba8();
//! let cutout = image::open("photo_cutout.png").unwrap().to_rgba8();
//! let mask = CorrectionMask::load("strokes.png".as_ref()).unwrap();
//!
//! let alpha = fusion::extract_alpha(&cutout);
//! let retouched = fusion::fuse(&original, &alpha, mask.as_luma()).unwrap();
//! retouched.save("photo_retouched.png").unwrap();
//! ```
//!
//! # Sessions
//!
//! Interactive front ends keep one [`Session`] per user. It owns the uploaded
//! original, the latest segmentation, and the latest retouched result.
//!
//! ```no_run
//! use bg_retouch::{CorrectionMask, PrecomputedSegmenter, RefineParams, Session};
//!
//! let mut session = Session::new();
//! session.upload(&std::fs::read("photo.jpg").unwrap(), "photo.jpg").unwrap();
//! session
//!     .run_segmentation(&PrecomputedSegmenter::new("photo_cutout.png"), &RefineParams::default())
//!     .unwrap();
//! let canvas = session.canvas_size(700).unwrap();
//! let mask = CorrectionMask::blank(canvas.width, canvas.height).unwrap();
//! session.apply_correction(Some(&mask)).unwrap();
//! std::fs::write(session.download_name(), session.final_png().unwrap()).unwrap();
//! ```

#![deny(missing_docs)]

pub mod canvas;
mod engine;
pub mod error;
pub mod fusion;
mod mask;
pub mod segmentation;
mod session;

pub use canvas::{CanvasSize, StrokeStyle, DEFAULT_MAX_DISPLAY_WIDTH};
pub use engine::{
    default_output_path, encode_png, is_supported_image, save_png, ProcessResult, RetouchOptions,
    Retoucher,
};
pub use error::{Error, Result};
pub use mask::{CorrectionMask, MaskSource, PAINTED};
pub use segmentation::{PrecomputedSegmenter, RefineParams, Segmenter};
pub use session::{ApplyOutcome, Session};
