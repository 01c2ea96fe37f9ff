use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use image::Rgb;

use bg_retouch::canvas::parse_hex_color;
use bg_retouch::{
    default_output_path, MaskSource, ProcessResult, RetouchOptions, Retoucher, StrokeStyle,
    DEFAULT_MAX_DISPLAY_WIDTH,
};

#[derive(Parser)]
#[command(
    name = "bg-retouch",
    about = "Paint back what background removal missed",
    version,
    after_help = "Typical flow:\n  \
                  1. bg-retouch canvas cutout.png        (paint in #00FF00 on cutout_canvas.png)\n  \
                  2. bg-retouch apply photo.jpg -s cutout.png -m cutout_canvas.png --canvas-strokes\n\n\
                  Without --canvas-strokes the mask is a separate stroke layer: any pixel with\n\
                  alpha (or, for opaque files, brightness) above zero counts as painted."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Maximum width of the paint surface (0 = native size)
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_DISPLAY_WIDTH)]
    max_display_width: u32,

    /// Stroke color used on paint canvases (hex, e.g. 00FF00)
    #[arg(long, global = true, default_value = "00FF00", value_parser = parse_stroke_color)]
    stroke_color: Rgb<u8>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Fuse a painted correction mask into a segmentation cutout
    Apply {
        /// Original image file or directory
        input: String,

        /// Segmented cutout file or directory (RGBA, same size as the original)
        #[arg(short, long)]
        segmented: String,

        /// Painted correction mask file or directory (omit to keep the segmentation)
        #[arg(short, long)]
        mask: Option<String>,

        /// Output file or directory (default: {name}_retouched.png)
        #[arg(short, long)]
        output: Option<String>,

        /// Masks are paint canvases; strokes are pixels in the stroke color
        #[arg(long)]
        canvas_strokes: bool,
    },
    /// Write a display-sized copy of a cutout to paint corrections on
    Canvas {
        /// Segmented cutout file
        segmented: String,

        /// Output file (default: {name}_canvas.png)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else if cli.quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let stroke = StrokeStyle {
        color: cli.stroke_color,
        ..StrokeStyle::default()
    };
    let mask_source = match &cli.command {
        Command::Apply {
            canvas_strokes: true,
            ..
        } => MaskSource::Canvas(stroke.color),
        _ => MaskSource::Layer,
    };
    let opts = RetouchOptions {
        max_display_width: cli.max_display_width,
        stroke,
        mask_source,
        verbose: cli.verbose,
        quiet: cli.quiet,
        ..RetouchOptions::default()
    };
    let retoucher = Retoucher::new(opts);

    match cli.command {
        Command::Apply {
            input,
            segmented,
            mask,
            output,
            ..
        } => run_apply(&retoucher, &input, &segmented, mask.as_deref(), output.as_deref()),
        Command::Canvas { segmented, output } => {
            run_canvas(&retoucher, &segmented, output.as_deref());
        }
    }
}

fn run_apply(
    retoucher: &Retoucher,
    input: &str,
    segmented: &str,
    mask: Option<&str>,
    output: Option<&str>,
) {
    let opts = retoucher.options();
    let input_path = Path::new(input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {input}");
        process::exit(1);
    }

    let results = if input_path.is_dir() {
        let Some(output_dir) = output.map(PathBuf::from) else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: bg-retouch apply <input_dir> -s <cutout_dir> -o <output_dir>");
            process::exit(1);
        };
        retoucher.process_directory(
            input_path,
            Path::new(segmented),
            mask.map(Path::new),
            &output_dir,
        )
    } else {
        let output_path = output.map_or_else(|| default_output_path(input_path), PathBuf::from);
        vec![retoucher.process_file(
            input_path,
            Path::new(segmented),
            mask.map(Path::new),
            &output_path,
        )]
    };

    let mut success_count = 0u32;
    let mut skip_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, opts);
        if r.skipped {
            skip_count += 1;
        } else if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Retouched: {success_count}");
        if skip_count > 0 {
            eprint!(", Skipped: {skip_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn run_canvas(retoucher: &Retoucher, segmented: &str, output: Option<&str>) {
    let input_path = Path::new(segmented);
    let output_path = output.map_or_else(
        || {
            let stem = input_path.file_stem().unwrap_or_default().to_string_lossy();
            input_path
                .parent()
                .unwrap_or(Path::new("."))
                .join(format!("{stem}_canvas.png"))
        },
        PathBuf::from,
    );

    match retoucher.export_canvas(input_path, &output_path) {
        Ok(size) => {
            if !retoucher.options().quiet {
                let stroke = retoucher.options().stroke;
                let [r, g, b] = stroke.color.0;
                eprintln!(
                    "[OK] {} ({}x{})",
                    output_path.display(),
                    size.width,
                    size.height
                );
                eprintln!(
                    "  -> paint with #{r:02X}{g:02X}{b:02X}, ~{}px pen, no anti-aliasing; \
                     apply with --canvas-strokes",
                    stroke.width
                );
            }
        }
        Err(e) => {
            eprintln!("[FAIL] {segmented}: {e}");
            process::exit(1);
        }
    }
}

fn parse_stroke_color(s: &str) -> Result<Rgb<u8>, String> {
    parse_hex_color(s).ok_or_else(|| format!("invalid hex color: {s}"))
}

fn print_result(result: &ProcessResult, opts: &RetouchOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.skipped {
        if !opts.quiet {
            eprintln!("[SKIP] {filename}: {}", result.message);
        }
    } else if result.success {
        if !opts.quiet {
            if result.painted_pixels > 0 {
                eprintln!("[OK] {filename} ({} painted pixels)", result.painted_pixels);
            } else {
                eprintln!("[OK] {filename}");
            }
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if opts.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
