//! File-level retouching: load, segment, fuse, save.

use std::collections::HashMap;
use std::ffi::OsString;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use tracing::{debug, warn};

use crate::canvas::{self, CanvasSize, StrokeStyle, DEFAULT_MAX_DISPLAY_WIDTH};
use crate::error::{Error, Result};
use crate::mask::{CorrectionMask, MaskSource};
use crate::segmentation::{PrecomputedSegmenter, RefineParams};
use crate::session::{ApplyOutcome, Session};

/// Options controlling retouch processing.
#[derive(Debug, Clone)]
pub struct RetouchOptions {
    /// Width cap for the paint surface; 0 keeps native size.
    pub max_display_width: u32,
    /// Parameters forwarded to the segmentation service.
    pub refine: RefineParams,
    /// Pen used on exported paint canvases.
    pub stroke: StrokeStyle,
    /// How mask files encode strokes.
    pub mask_source: MaskSource,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

impl Default for RetouchOptions {
    fn default() -> Self {
        Self {
            max_display_width: DEFAULT_MAX_DISPLAY_WIDTH,
            refine: RefineParams::default(),
            stroke: StrokeStyle::default(),
            mask_source: MaskSource::Layer,
            verbose: false,
            quiet: false,
        }
    }
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the original image.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file was skipped (no cutout to pair it with).
    pub skipped: bool,
    /// Painted pixels in the correction mask, at mask resolution.
    pub painted_pixels: usize,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            skipped: false,
            painted_pixels: 0,
            message: String::new(),
        }
    }

    fn failed(path: &Path, message: String) -> Self {
        Self {
            message,
            ..Self::new(path)
        }
    }
}

/// Drives a [`Session`] over files on disk.
#[derive(Debug, Clone, Default)]
pub struct Retoucher {
    opts: RetouchOptions,
}

impl Retoucher {
    /// Create a retoucher with the given options.
    #[must_use]
    pub fn new(opts: RetouchOptions) -> Self {
        Self { opts }
    }

    /// Options this retoucher was built with.
    #[must_use]
    pub fn options(&self) -> &RetouchOptions {
        &self.opts
    }

    /// Retouch one image.
    ///
    /// `segmented` is the cutout produced by the segmentation service for
    /// `original`. `mask` is the painted correction; `None` means nothing was
    /// drawn and the cutout's alpha is applied unchanged.
    #[must_use]
    pub fn process_file(
        &self,
        original: &Path,
        segmented: &Path,
        mask: Option<&Path>,
        output: &Path,
    ) -> ProcessResult {
        let mut result = ProcessResult::new(original);

        match self.retouch(original, segmented, mask, output) {
            Ok(painted) => {
                result.success = true;
                result.painted_pixels = painted;
                result.message = if painted == 0 {
                    "No correction painted, segmentation kept".to_string()
                } else {
                    format!("Retouched ({painted} painted pixels)")
                };
            }
            Err(e) => {
                warn!(path = %original.display(), error = %e, "retouch failed");
                result.message = e.to_string();
            }
        }

        result
    }

    fn retouch(
        &self,
        original: &Path,
        segmented: &Path,
        mask: Option<&Path>,
        output: &Path,
    ) -> Result<usize> {
        let name = original
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
        let bytes = std::fs::read(original)?;

        let mut session = Session::new();
        session.upload(&bytes, &name)?;
        session.run_segmentation(&PrecomputedSegmenter::new(segmented), &self.opts.refine)?;

        let mask = match mask {
            Some(path) => CorrectionMask::load_as(path, self.opts.mask_source)?,
            None => {
                let size = session
                    .canvas_size(self.opts.max_display_width)
                    .ok_or(Error::NoOriginal)?;
                CorrectionMask::blank(size.width, size.height)?
            }
        };

        let painted = match session.apply_correction(Some(&mask))? {
            ApplyOutcome::Applied { painted_pixels } => painted_pixels,
            ApplyOutcome::NoMask => 0,
        };

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let retouched = session.final_image().ok_or(Error::NoFinalImage)?;
        save_png(retouched, output)?;
        debug!(output = %output.display(), "retouched image written");

        Ok(painted)
    }

    /// Write the display-sized paint canvas for a cutout.
    ///
    /// The canvas is flattened onto a gray matte and has no alpha channel.
    /// Strokes painted on it in the configured stroke color are read back with
    /// [`MaskSource::Canvas`]. Returns the canvas size.
    ///
    /// # Errors
    ///
    /// Returns an error if the cutout cannot be read or decoded, or the output
    /// cannot be written.
    pub fn export_canvas(&self, segmented: &Path, output: &Path) -> Result<CanvasSize> {
        let bytes = std::fs::read(segmented)?;
        let cutout = image::load_from_memory(&bytes)
            .map_err(Error::Decode)?
            .to_rgba8();
        let size = CanvasSize::fit(
            cutout.width(),
            cutout.height(),
            self.opts.max_display_width,
        );
        debug!(
            width = size.width,
            height = size.height,
            downscaled = size.is_downscaled(cutout.width(), cutout.height()),
            "paint canvas sized"
        );
        let format = lossless_format(output)?;
        canvas::paint_canvas(&cutout, size, &self.opts.stroke).save_with_format(output, format)?;
        Ok(size)
    }

    /// Retouch every supported image in a directory.
    ///
    /// Cutouts and masks are paired with originals by file stem. Originals
    /// without a cutout are skipped; originals without a mask keep their
    /// segmentation. An original whose stem was already taken by an earlier
    /// file (e.g. `a.png` and `a.bmp`) fails, since both would write the same
    /// output. Uses parallel iteration when the `cli` feature is enabled
    /// (via rayon).
    #[must_use]
    pub fn process_directory(
        &self,
        original_dir: &Path,
        segmented_dir: &Path,
        mask_dir: Option<&Path>,
        output_dir: &Path,
    ) -> Vec<ProcessResult> {
        let originals = match list_images(original_dir) {
            Ok(paths) => paths,
            Err(e) => {
                return vec![ProcessResult::failed(
                    original_dir,
                    format!("Failed to read directory: {e}"),
                )];
            }
        };

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                return vec![ProcessResult::failed(
                    output_dir,
                    format!("Failed to create output directory: {e}"),
                )];
            }
        }

        let cutouts = match index_by_stem(segmented_dir) {
            Ok(index) => index,
            Err(e) => {
                return vec![ProcessResult::failed(
                    segmented_dir,
                    format!("Failed to read directory: {e}"),
                )];
            }
        };
        let masks = match mask_dir.map(index_by_stem).transpose() {
            Ok(index) => index.unwrap_or_default(),
            Err(e) => {
                return vec![ProcessResult::failed(
                    mask_dir.unwrap_or(segmented_dir),
                    format!("Failed to read directory: {e}"),
                )];
            }
        };

        let mut claimed: HashMap<OsString, &PathBuf> = HashMap::new();
        let jobs: Vec<(&PathBuf, Job)> = originals
            .iter()
            .map(|original| {
                let stem = original.file_stem().unwrap_or_default().to_os_string();
                if let Some(first) = claimed.get(&stem) {
                    return (original, Job::Duplicate((*first).clone()));
                }
                claimed.insert(stem.clone(), original);
                let job = match cutouts.get(&stem) {
                    Some(cutout) => Job::Retouch {
                        segmented: cutout.clone(),
                        mask: masks.get(&stem).cloned(),
                    },
                    None => Job::NoCutout,
                };
                (original, job)
            })
            .collect();

        let process_one = |(original, job): &(&PathBuf, Job)| match job {
            Job::Retouch { segmented, mask } => {
                let output = output_dir.join(output_file_name(original));
                self.process_file(original, segmented, mask.as_deref(), &output)
            }
            Job::NoCutout => {
                let mut result = ProcessResult::new(original);
                result.success = true;
                result.skipped = true;
                result.message = "No segmented cutout found".to_string();
                result
            }
            Job::Duplicate(first) => ProcessResult::failed(
                original,
                format!(
                    "Output name collides with {}",
                    first.file_name().unwrap_or_default().to_string_lossy()
                ),
            ),
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            jobs.par_iter().map(process_one).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            jobs.iter().map(process_one).collect()
        }
    }
}

fn list_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .filter(|p| is_supported_image(p))
        .collect();
    paths.sort();
    Ok(paths)
}

/// What to do with one original in a batch.
enum Job {
    Retouch {
        segmented: PathBuf,
        mask: Option<PathBuf>,
    },
    NoCutout,
    /// Same stem as an earlier original.
    Duplicate(PathBuf),
}

/// Map file stem to path for every supported image in `dir`; the first path in
/// sorted order wins a shared stem.
fn index_by_stem(dir: &Path) -> std::io::Result<HashMap<OsString, PathBuf>> {
    let mut index = HashMap::new();
    for path in list_images(dir)? {
        if let Some(stem) = path.file_stem() {
            index.entry(stem.to_os_string()).or_insert(path);
        }
    }
    Ok(index)
}

fn output_file_name(input: &Path) -> String {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    format!("{stem}_retouched.png")
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Encode an RGBA image as PNG bytes.
///
/// # Errors
///
/// Returns [`Error::Image`] if encoding fails.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Pick the output format from the extension, rejecting lossy ones.
fn lossless_format(path: &Path) -> Result<ImageFormat> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;
    match format {
        ImageFormat::Png | ImageFormat::WebP => Ok(format),
        _ => Err(Error::UnsupportedFormat(format!("{format:?}"))),
    }
}

/// Save an RGBA image to a lossless format that keeps the alpha channel.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for lossy or alpha-less formats, or an
/// error if writing fails.
pub fn save_png(img: &RgbaImage, path: &Path) -> Result<()> {
    let format = lossless_format(path)?;
    img.save_with_format(path, format)?;
    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_retouched.png"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(output_file_name(input))
}
