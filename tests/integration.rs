use std::path::Path;

use bg_retouch::{
    encode_png, fusion, CorrectionMask, MaskSource, RefineParams, RetouchOptions, Retoucher,
    Session, StrokeStyle,
};
use image::{GrayImage, Luma, Rgba, RgbaImage};

fn original(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 10) as u8, (y * 10) as u8, 200, 255]))
}

/// Cutout whose top half is foreground; colors deliberately altered.
fn cutout(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |_, y| Rgba([0, 0, 0, if y < h / 2 { 255 } else { 0 }]))
}

fn write(path: &Path, img: &RgbaImage) {
    img.save(path).unwrap();
}

#[test]
fn concrete_block_scenario() {
    let alpha = GrayImage::from_pixel(4, 4, Luma([100]));
    let mask = GrayImage::from_raw(2, 2, vec![255, 0, 0, 0]).unwrap();

    let resampled = fusion::resize_nearest(&mask, 4, 4).unwrap();
    let fused = fusion::fuse_alpha(&alpha, &mask).unwrap();

    let expected_mask: Vec<u8> = vec![
        255, 255, 0, 0, //
        255, 255, 0, 0, //
        0, 0, 0, 0, //
        0, 0, 0, 0,
    ];
    let expected_alpha: Vec<u8> = vec![
        255, 255, 100, 100, //
        255, 255, 100, 100, //
        100, 100, 100, 100, //
        100, 100, 100, 100,
    ];
    assert_eq!(resampled.into_raw(), expected_mask);
    assert_eq!(fused.into_raw(), expected_alpha);
}

#[test]
fn process_file_paints_back_lower_half() {
    let dir = tempfile::tempdir().unwrap();
    let orig_path = dir.path().join("dog.png");
    let cut_path = dir.path().join("dog_cut.png");
    let mask_path = dir.path().join("dog_mask.png");
    let out_path = dir.path().join("out").join("dog_retouched.png");

    write(&orig_path, &original(20, 10));
    write(&cut_path, &cutout(20, 10));
    // Painted at half resolution: bottom-left quarter of the canvas.
    let mask = GrayImage::from_fn(10, 5, |x, y| Luma([if x < 5 && y >= 3 { 255 } else { 0 }]));
    mask.save(&mask_path).unwrap();

    let retoucher = Retoucher::new(RetouchOptions::default());
    let result = retoucher.process_file(&orig_path, &cut_path, Some(&mask_path), &out_path);
    assert!(result.success, "{}", result.message);
    assert_eq!(result.painted_pixels, 10);

    let out = image::open(&out_path).unwrap().to_rgba8();
    let orig = original(20, 10);
    assert_eq!(out.dimensions(), (20, 10));
    for (x, y, px) in out.enumerate_pixels() {
        let o = orig.get_pixel(x, y);
        assert_eq!(&px.0[..3], &o.0[..3], "color changed at ({x},{y})");
        let expected = if y < 5 || (x < 10 && y >= 6) { 255 } else { 0 };
        assert_eq!(px[3], expected, "alpha at ({x},{y})");
    }
}

#[test]
fn process_file_without_mask_keeps_segmentation() {
    let dir = tempfile::tempdir().unwrap();
    let orig_path = dir.path().join("a.png");
    let cut_path = dir.path().join("a_cut.png");
    let out_path = dir.path().join("a_retouched.png");
    write(&orig_path, &original(8, 8));
    write(&cut_path, &cutout(8, 8));

    let result =
        Retoucher::default().process_file(&orig_path, &cut_path, None, &out_path);
    assert!(result.success, "{}", result.message);
    assert_eq!(result.painted_pixels, 0);

    let out = image::open(&out_path).unwrap().to_rgba8();
    assert_eq!(fusion::extract_alpha(&out), fusion::extract_alpha(&cutout(8, 8)));
}

#[test]
fn process_file_reports_unreadable_original() {
    let dir = tempfile::tempdir().unwrap();
    let orig_path = dir.path().join("broken.png");
    std::fs::write(&orig_path, b"definitely not a png").unwrap();
    let cut_path = dir.path().join("cut.png");
    write(&cut_path, &cutout(4, 4));

    let result = Retoucher::default().process_file(
        &orig_path,
        &cut_path,
        None,
        &dir.path().join("o.png"),
    );
    assert!(!result.success);
    assert!(result.message.contains("decode"));
}

#[test]
fn process_directory_pairs_by_stem() {
    let dir = tempfile::tempdir().unwrap();
    let originals = dir.path().join("originals");
    let cutouts = dir.path().join("cutouts");
    let masks = dir.path().join("masks");
    let output = dir.path().join("output");
    for d in [&originals, &cutouts, &masks] {
        std::fs::create_dir_all(d).unwrap();
    }

    write(&originals.join("one.png"), &original(6, 6));
    write(&originals.join("two.png"), &original(6, 6));
    write(&originals.join("lonely.png"), &original(6, 6));
    write(&cutouts.join("one.png"), &cutout(6, 6));
    write(&cutouts.join("two.png"), &cutout(6, 6));
    GrayImage::from_pixel(3, 3, Luma([255]))
        .save(masks.join("two.png"))
        .unwrap();

    let results = Retoucher::default().process_directory(
        &originals,
        &cutouts,
        Some(&masks),
        &output,
    );
    assert_eq!(results.len(), 3);

    let by_name = |name: &str| {
        results
            .iter()
            .find(|r| r.path.file_name().unwrap() == name)
            .unwrap()
    };
    assert!(by_name("lonely.png").skipped);
    assert!(by_name("one.png").success);
    assert_eq!(by_name("two.png").painted_pixels, 9);

    let two = image::open(output.join("two_retouched.png")).unwrap().to_rgba8();
    assert!(two.pixels().all(|p| p[3] == 255));
    assert!(output.join("one_retouched.png").exists());
    assert!(!output.join("lonely_retouched.png").exists());
}

#[test]
fn export_canvas_caps_width() {
    let dir = tempfile::tempdir().unwrap();
    let cut_path = dir.path().join("wide.png");
    write(&cut_path, &cutout(1400, 20));
    let out_path = dir.path().join("wide_canvas.png");

    let size = Retoucher::default()
        .export_canvas(&cut_path, &out_path)
        .unwrap();
    assert_eq!((size.width, size.height), (700, 10));
    assert_eq!(image::image_dimensions(&out_path).unwrap(), (700, 10));
}

#[test]
fn painting_on_exported_canvas_keeps_soft_alpha() {
    let dir = tempfile::tempdir().unwrap();
    let orig_path = dir.path().join("c.png");
    let cut_path = dir.path().join("c_cut.png");
    let canvas_path = dir.path().join("c_canvas.png");
    let out_path = dir.path().join("c_retouched.png");

    // Transparent, soft, and opaque column bands.
    let band_alpha = |x: u32| match x {
        0..=399 => 0u8,
        400..=799 => 128,
        _ => 255,
    };
    let cut = RgbaImage::from_fn(1400, 20, |x, _| Rgba([0, 0, 0, band_alpha(x)]));
    write(&orig_path, &original(1400, 20));
    write(&cut_path, &cut);

    let stroke = StrokeStyle::default();
    let opts = RetouchOptions {
        mask_source: MaskSource::Canvas(stroke.color),
        ..RetouchOptions::default()
    };
    let retoucher = Retoucher::new(opts);
    retoucher.export_canvas(&cut_path, &canvas_path).unwrap();

    let exported = image::open(&canvas_path).unwrap();
    assert!(!exported.color().has_alpha());
    let mut painted = exported.to_rgb8();
    painted.put_pixel(0, 0, stroke.color);
    painted.save(&canvas_path).unwrap();

    let result = retoucher.process_file(&orig_path, &cut_path, Some(&canvas_path), &out_path);
    assert!(result.success, "{}", result.message);
    assert_eq!(result.painted_pixels, 1);

    let out = image::open(&out_path).unwrap().to_rgba8();
    for (x, y, px) in out.enumerate_pixels() {
        let expected = if x < 2 && y < 2 { 255 } else { band_alpha(x) };
        assert_eq!(px[3], expected, "alpha at ({x},{y})");
    }
}

#[test]
fn missing_mask_file_reports_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let orig_path = dir.path().join("m.png");
    let cut_path = dir.path().join("m_cut.png");
    write(&orig_path, &original(4, 4));
    write(&cut_path, &cutout(4, 4));

    let result = Retoucher::default().process_file(
        &orig_path,
        &cut_path,
        Some(&dir.path().join("absent.png")),
        &dir.path().join("m_retouched.png"),
    );
    assert!(!result.success);
    assert!(result.message.starts_with("I/O error"), "{}", result.message);
}

#[test]
fn process_directory_rejects_duplicate_stems() {
    let dir = tempfile::tempdir().unwrap();
    let originals = dir.path().join("originals");
    let cutouts = dir.path().join("cutouts");
    let output = dir.path().join("output");
    for d in [&originals, &cutouts] {
        std::fs::create_dir_all(d).unwrap();
    }

    write(&originals.join("a.png"), &original(6, 6));
    write(&originals.join("a.bmp"), &original(6, 6));
    write(&cutouts.join("a.png"), &cutout(6, 6));

    let results = Retoucher::default().process_directory(&originals, &cutouts, None, &output);
    assert_eq!(results.len(), 2);

    let bmp = results.iter().find(|r| r.path.ends_with("a.bmp")).unwrap();
    let png = results.iter().find(|r| r.path.ends_with("a.png")).unwrap();
    assert!(bmp.success, "{}", bmp.message);
    assert!(!png.success);
    assert!(png.message.contains("a.bmp"), "{}", png.message);

    let written: Vec<_> = std::fs::read_dir(&output).unwrap().collect();
    assert_eq!(written.len(), 1);
}

#[test]
fn session_overlay_flow() {
    let orig = original(10, 10);
    let mut session = Session::new();
    session.upload(&encode_png(&orig).unwrap(), "cat.jpeg").unwrap();

    let segment = |_: &[u8], params: &RefineParams| -> bg_retouch::Result<Vec<u8>> {
        assert!(params.alpha_matting);
        encode_png(&cutout(10, 10))
    };
    let params = RefineParams {
        alpha_matting: true,
        ..RefineParams::default()
    };
    session.run_segmentation(&segment, &params).unwrap();

    // Drawing widget returns a transparent overlay with one stroke.
    let mut overlay = RgbaImage::new(5, 5);
    overlay.put_pixel(0, 4, Rgba([0, 255, 0, 128]));
    let mask = CorrectionMask::from_overlay(&overlay).unwrap();
    session.apply_correction(Some(&mask)).unwrap();

    let out = session.final_image().unwrap();
    assert_eq!(out.get_pixel(1, 9)[3], 255);
    assert_eq!(out.get_pixel(2, 9)[3], 0);
    assert_eq!(out.get_pixel(9, 0)[3], 255);
    assert_eq!(session.download_name(), "cat_retouched.png");
}
