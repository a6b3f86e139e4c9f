//! End-to-end tests against the real `image`-crate backend.
//!
//! Inputs are synthetic gradients encoded in memory, so no fixtures are
//! needed. These exercise the same properties the mock-based unit tests do,
//! but with real codecs in the loop.

use image::{DynamicImage, ImageFormat, RgbImage};
use media_variants::config::UploadSettings;
use media_variants::imaging::{
    OptimizeOptions, ResponsiveConfig, RustBackend, ThumbnailConfig, create_responsive_variants,
    create_thumbnail, create_webp, dimensions, is_eligible, optimize, probe,
};
use media_variants::process::{process_files, process_upload, write_outputs};
use media_variants::types::{SourceFile, VariantDescriptor, VariantOutcome};
use std::io::Cursor;

fn encode(format: ImageFormat, width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, format)
        .unwrap();
    out.into_inner()
}

fn source(format: ImageFormat, name: &str, width: u32, height: u32) -> SourceFile {
    SourceFile::from_bytes(name, encode(format, width, height))
}

/// The descriptor's recorded dimensions match a fresh probe of its buffer.
fn assert_reprobe(backend: &RustBackend, descriptor: &VariantDescriptor) {
    let meta = probe(backend, &descriptor.buffer);
    assert_eq!(meta.format.as_deref(), Some("webp"), "{}", descriptor.name);
    assert_eq!(meta.width, Some(descriptor.width), "{}", descriptor.name);
    assert_eq!(meta.height, Some(descriptor.height), "{}", descriptor.name);
}

#[test]
fn thumbnail_fits_box_with_one_tight_bound() {
    let backend = RustBackend::new();
    let file = source(ImageFormat::Jpeg, "photo.jpg", 1000, 400);

    let thumb = create_thumbnail(&backend, &file, &ThumbnailConfig::default())
        .into_variant()
        .expect("thumbnail for 1000x400");

    assert_eq!((thumb.width, thumb.height), (245, 98));
    assert_eq!(thumb.name, "thumbnail_photo.jpg");
    assert_eq!(thumb.ext, ".webp");
    assert_eq!(thumb.mime, "image/webp");
    assert_eq!(thumb.hash, format!("thumbnail_{}", file.hash));
    assert_reprobe(&backend, &thumb);
}

#[test]
fn no_thumbnail_inside_box() {
    let backend = RustBackend::new();
    let file = source(ImageFormat::Png, "icon.png", 245, 156);
    assert_eq!(
        create_thumbnail(&backend, &file, &ThumbnailConfig::default()),
        VariantOutcome::NoVariant
    );
}

#[test]
fn png_names_are_rewritten() {
    let backend = RustBackend::new();
    let file = source(ImageFormat::Png, "photo.png", 400, 300);

    let thumb = create_thumbnail(&backend, &file, &ThumbnailConfig::default())
        .into_variant()
        .unwrap();
    let copy = create_webp(&backend, &file, Default::default())
        .into_variant()
        .unwrap();

    assert_eq!(thumb.name, "thumbnail_photo.webp");
    assert_eq!(copy.name, "photo.webp");
    assert_eq!(copy.hash, file.hash);
    assert_eq!((copy.width, copy.height), (400, 300));
    assert_reprobe(&backend, &copy);
}

#[test]
fn gif_gets_nothing() {
    let backend = RustBackend::new();
    let file = source(ImageFormat::Gif, "anim.gif", 800, 800);

    assert!(!is_eligible(&backend, &file.buffer));
    assert_eq!(
        dimensions(&backend, &file.buffer).map(|d| (d.width, d.height)),
        Some((800, 800))
    );
    assert!(create_thumbnail(&backend, &file, &ThumbnailConfig::default()).is_skipped());
    assert!(create_webp(&backend, &file, Default::default()).is_skipped());
    assert!(
        create_responsive_variants(&backend, &file, &ResponsiveConfig::default(), true)
            .is_empty()
    );

    let optimized = optimize(&backend, &file.buffer, &OptimizeOptions::default());
    assert_eq!(optimized.buffer, file.buffer);
    assert_eq!(optimized.info, None);
}

#[test]
fn garbage_is_not_an_error() {
    let backend = RustBackend::new();
    let file = SourceFile::from_bytes("notes.txt", b"plain text, not pixels".to_vec());

    assert_eq!(probe(&backend, &file.buffer).format, None);
    assert!(create_thumbnail(&backend, &file, &ThumbnailConfig::default()).is_skipped());
}

#[test]
fn wide_image_gets_every_default_breakpoint() {
    let backend = RustBackend::new();
    let file = source(ImageFormat::Jpeg, "pano.jpg", 2000, 400);

    let variants =
        create_responsive_variants(&backend, &file, &ResponsiveConfig::default(), true);

    let keys: Vec<&str> = variants.iter().map(|v| v.key.as_str()).collect();
    assert_eq!(keys, vec!["large", "medium", "small"]);
    for variant in &variants {
        let max = ResponsiveConfig::default().breakpoints[&variant.key];
        assert_eq!(variant.file.width, max);
        assert!(variant.file.height <= max);
        assert_eq!(variant.file.name, format!("{}_pano.jpg", variant.key));
        assert_reprobe(&backend, &variant.file);
    }
}

#[test]
fn small_image_gets_no_breakpoints() {
    let backend = RustBackend::new();
    let file = source(ImageFormat::Jpeg, "small.jpg", 400, 300);
    assert!(
        create_responsive_variants(&backend, &file, &ResponsiveConfig::default(), true)
            .is_empty()
    );
}

#[test]
fn optimize_never_grows() {
    let backend = RustBackend::new();
    for format in [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::Tiff] {
        let input = encode(format, 320, 240);
        let result = optimize(&backend, &input, &OptimizeOptions::default());

        assert!(result.buffer.len() <= input.len(), "{format:?}");
        let info = result.info.expect("optimizer info");
        assert_eq!((info.width, info.height), (320, 240));
    }
}

#[test]
fn upload_pipeline_end_to_end() {
    let tmp = tempfile::TempDir::new().unwrap();
    let inputs = tmp.path().join("in");
    let out = tmp.path().join("out");
    std::fs::create_dir_all(&inputs).unwrap();
    std::fs::write(inputs.join("a.jpg"), encode(ImageFormat::Jpeg, 1200, 800)).unwrap();
    std::fs::write(inputs.join("b.gif"), encode(ImageFormat::Gif, 64, 64)).unwrap();

    let files = media_variants::process::collect_inputs(&[inputs.clone()]).unwrap();
    let result = process_files(&RustBackend::new(), &files, &UploadSettings::default(), None);
    assert_eq!(result.uploads.len(), 2);
    assert!(result.failures.is_empty());

    let jpeg = &result.uploads[0];
    assert!(jpeg.thumbnail.as_variant().is_some());
    let keys: Vec<&str> = jpeg.responsive.iter().map(|v| v.key.as_str()).collect();
    assert_eq!(keys, vec!["large", "medium", "small"]);

    let manifest = write_outputs(&out, &result.uploads).unwrap();
    assert!(manifest.exists());
    let thumb = jpeg.thumbnail.as_variant().unwrap();
    assert!(out.join(format!("{}.webp", thumb.hash)).exists());
}

#[test]
fn process_upload_applies_settings() {
    let backend = RustBackend::new();
    let mut settings = UploadSettings::default();
    settings.upload.size_optimization = false;
    settings.upload.responsive_dimensions = false;
    let file = source(ImageFormat::Png, "shot.png", 1500, 1000);

    let upload = process_upload(&backend, &file, &settings);

    assert_eq!(upload.file.buffer, file.buffer);
    assert_eq!(upload.info.map(|i| (i.width, i.height)), Some((1500, 1000)));
    assert!(upload.responsive.is_empty());
    assert!(upload.webp.as_variant().is_some());
}

#[test]
fn webp_upload_writes_original_and_copy_separately() {
    let tmp = tempfile::TempDir::new().unwrap();
    let backend = RustBackend::new();
    let file = source(ImageFormat::WebP, "photo.webp", 400, 300);

    let upload = process_upload(&backend, &file, &UploadSettings::default());
    let copy = upload.webp.as_variant().expect("webp copy").clone();
    write_outputs(tmp.path(), std::slice::from_ref(&upload)).unwrap();

    let stored_original =
        std::fs::read(tmp.path().join(format!("original_{}.webp", file.hash))).unwrap();
    let stored_copy = std::fs::read(tmp.path().join(format!("{}.webp", file.hash))).unwrap();
    assert_eq!(stored_original, upload.file.buffer);
    assert_eq!(stored_copy, copy.buffer);
}
