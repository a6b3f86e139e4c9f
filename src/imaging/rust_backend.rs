//! Pure Rust codec backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Probe | `ImageReader::with_guessed_format` + `into_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate decoders |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3`, target from [`calculate_fit_inside`] |
//! | Encode → JPEG / PNG / TIFF | `image::codecs::*` encoders |
//! | Encode → WebP (lossy) | `webp` crate (libwebp) |
//! | Orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//!
//! Intermediate buffers (resize output, orientation-normalized output) are
//! written in the source format at maximum quality so the final encode is the
//! only lossy step.

use super::backend::{BackendError, Dimensions, ImageBackend, Metadata};
use super::calculations::calculate_fit_inside;
use super::params::{EncodeParams, OutputFormat, Quality, ResizeSpec};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;

/// Lowercase name for a detected container format.
pub fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        other => format!("{other:?}").to_lowercase(),
    }
}

/// Codec backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Open a reader over an in-memory buffer with its format sniffed.
fn open(bytes: &[u8]) -> Result<(ImageReader<Cursor<&[u8]>>, ImageFormat), BackendError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader.format().ok_or(BackendError::UnknownFormat)?;
    Ok((reader, format))
}

/// Map a detected format to one we can write back, or fail.
fn writable(format: ImageFormat) -> Result<OutputFormat, BackendError> {
    let name = format_name(format);
    OutputFormat::from_name(&name).ok_or(BackendError::UnsupportedFormat(name))
}

fn decode(bytes: &[u8]) -> Result<(DynamicImage, ImageFormat), BackendError> {
    let (reader, format) = open(bytes)?;
    let img = reader.decode().map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to decode {}: {}", format_name(format), e))
    })?;
    Ok((img, format))
}

/// Decode and rotate/flip the pixels according to the embedded orientation.
fn decode_oriented(bytes: &[u8]) -> Result<(DynamicImage, ImageFormat), BackendError> {
    let (reader, format) = open(bytes)?;
    let failed = |e: image::ImageError| {
        BackendError::ProcessingFailed(format!("Failed to decode {}: {}", format_name(format), e))
    };
    let mut decoder = reader.into_decoder().map_err(failed)?;
    let orientation = decoder.orientation().map_err(failed)?;
    let mut img = DynamicImage::from_decoder(decoder).map_err(failed)?;
    img.apply_orientation(orientation);
    Ok((img, format))
}

/// Encode into the requested format.
fn encode_image(
    img: &DynamicImage,
    format: OutputFormat,
    quality: Quality,
) -> Result<Vec<u8>, BackendError> {
    let mut out = Cursor::new(Vec::new());
    let result = match format {
        OutputFormat::WebP => return encode_webp(img, quality),
        // JPEG has no alpha channel
        OutputFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality.value() as u8)),
        OutputFormat::Png => img.write_with_encoder(PngEncoder::new_with_quality(
            &mut out,
            CompressionType::Best,
            PngFilter::Adaptive,
        )),
        OutputFormat::Tiff => img.write_with_encoder(TiffEncoder::new(&mut out)),
    };
    result.map_err(|e| {
        BackendError::ProcessingFailed(format!("{} encode failed: {}", format.name(), e))
    })?;
    Ok(out.into_inner())
}

/// Largest width or height libwebp accepts.
const WEBP_MAX_DIMENSION: u32 = 16383;

/// Lossy WebP through libwebp.
fn encode_webp(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    if img.width() > WEBP_MAX_DIMENSION || img.height() > WEBP_MAX_DIMENSION {
        return Err(BackendError::ProcessingFailed(format!(
            "webp encode failed: {}x{} exceeds {WEBP_MAX_DIMENSION}px limit",
            img.width(),
            img.height()
        )));
    }
    let rgba = img.to_rgba8();
    let encoder = webp::Encoder::from_rgba(&rgba, rgba.width(), rgba.height());
    let encoded = encoder
        .encode_simple(false, quality.value() as f32)
        .map_err(|e| BackendError::ProcessingFailed(format!("webp encode failed: {e:?}")))?;
    Ok(encoded.to_vec())
}

/// Encode an intermediate buffer without adding another lossy generation
/// where the format allows it.
fn encode_intermediate(img: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>, BackendError> {
    match format {
        OutputFormat::WebP => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            let mut out = Cursor::new(Vec::new());
            rgba.write_with_encoder(WebPEncoder::new_lossless(&mut out))
                .map_err(|e| BackendError::ProcessingFailed(format!("webp encode failed: {e}")))?;
            Ok(out.into_inner())
        }
        other => encode_image(img, other, Quality::new(100)),
    }
}

impl ImageBackend for RustBackend {
    fn probe(&self, bytes: &[u8]) -> Result<Metadata, BackendError> {
        let (reader, format) = open(bytes)?;
        let (width, height) = reader.into_dimensions().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Metadata {
            format: Some(format_name(format)),
            width: Some(width),
            height: Some(height),
            size: Some(bytes.len() as u64),
        })
    }

    fn resize(&self, bytes: &[u8], spec: &ResizeSpec) -> Result<Vec<u8>, BackendError> {
        let (img, format) = decode(bytes)?;
        let output_format = writable(format)?;

        let source = Dimensions {
            width: img.width(),
            height: img.height(),
        };
        let bounds = Dimensions {
            width: spec.max_width,
            height: spec.max_height,
        };
        let target = calculate_fit_inside(source, bounds);
        if target == source {
            return Ok(bytes.to_vec());
        }

        let resized = img.resize_exact(target.width, target.height, FilterType::Lanczos3);
        encode_intermediate(&resized, output_format)
    }

    fn encode(&self, bytes: &[u8], params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
        let (img, _) = decode(bytes)?;
        encode_image(&img, params.format, params.quality)
    }

    fn normalize_orientation(&self, bytes: &[u8]) -> Result<Vec<u8>, BackendError> {
        let (img, format) = decode_oriented(bytes)?;
        encode_intermediate(&img, writable(format)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::operations::{OptimizeOptions, create_webp, optimize};
    use crate::test_helpers::{encode_synthetic, synthetic_image, with_exif_orientation};
    use crate::types::{SourceFile, VariantOutcome};

    #[test]
    fn probe_synthetic_jpeg() {
        let bytes = encode_synthetic(ImageFormat::Jpeg, 200, 150);
        let meta = RustBackend::new().probe(&bytes).unwrap();

        assert_eq!(meta.format.as_deref(), Some("jpeg"));
        assert_eq!(meta.width, Some(200));
        assert_eq!(meta.height, Some(150));
        assert_eq!(meta.size, Some(bytes.len() as u64));
    }

    #[test]
    fn probe_names_every_processable_format() {
        let backend = RustBackend::new();
        for (format, name) in [
            (ImageFormat::Jpeg, "jpeg"),
            (ImageFormat::Png, "png"),
            (ImageFormat::WebP, "webp"),
            (ImageFormat::Tiff, "tiff"),
            (ImageFormat::Gif, "gif"),
        ] {
            let meta = backend.probe(&encode_synthetic(format, 40, 30)).unwrap();
            assert_eq!(meta.format.as_deref(), Some(name));
            assert_eq!(meta.dimensions(), Some(Dimensions { width: 40, height: 30 }));
        }
    }

    #[test]
    fn probe_garbage_errors() {
        let result = RustBackend::new().probe(b"definitely not an image");
        assert!(matches!(result, Err(BackendError::UnknownFormat)));
    }

    #[test]
    fn probe_truncated_jpeg_errors() {
        let bytes = encode_synthetic(ImageFormat::Jpeg, 64, 64);
        assert!(RustBackend::new().probe(&bytes[..4]).is_err());
    }

    #[test]
    fn resize_fits_inside_and_keeps_format() {
        let backend = RustBackend::new();
        let bytes = encode_synthetic(ImageFormat::Png, 1000, 400);

        let out = backend.resize(&bytes, &ResizeSpec::inside(245, 156)).unwrap();
        let meta = backend.probe(&out).unwrap();

        assert_eq!(meta.format.as_deref(), Some("png"));
        assert_eq!(meta.dimensions(), Some(Dimensions { width: 245, height: 98 }));
    }

    #[test]
    fn resize_never_upscales() {
        let backend = RustBackend::new();
        let bytes = encode_synthetic(ImageFormat::Jpeg, 100, 80);

        let out = backend.resize(&bytes, &ResizeSpec::square(500)).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn resize_unwritable_source_errors() {
        let bytes = encode_synthetic(ImageFormat::Gif, 600, 600);
        let result = RustBackend::new().resize(&bytes, &ResizeSpec::square(100));
        assert!(matches!(result, Err(BackendError::UnsupportedFormat(f)) if f == "gif"));
    }

    #[test]
    fn encode_to_webp() {
        let backend = RustBackend::new();
        let bytes = encode_synthetic(ImageFormat::Jpeg, 320, 240);

        let out = backend
            .encode(
                &bytes,
                &EncodeParams {
                    format: OutputFormat::WebP,
                    quality: Quality::new(80),
                },
            )
            .unwrap();
        let meta = backend.probe(&out).unwrap();

        assert_eq!(meta.format.as_deref(), Some("webp"));
        assert_eq!(meta.dimensions(), Some(Dimensions { width: 320, height: 240 }));
    }

    #[test]
    fn encode_rgba_to_jpeg_drops_alpha() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            16,
            16,
            image::Rgba([10, 20, 30, 128]),
        ));
        let out = encode_image(&img, OutputFormat::Jpeg, Quality::new(80)).unwrap();
        let meta = RustBackend::new().probe(&out).unwrap();
        assert_eq!(meta.format.as_deref(), Some("jpeg"));
    }

    #[test]
    fn encode_every_output_format() {
        let img = synthetic_image(48, 32);
        for format in [
            OutputFormat::Jpeg,
            OutputFormat::Png,
            OutputFormat::WebP,
            OutputFormat::Tiff,
        ] {
            let out = encode_image(&img, format, Quality::default()).unwrap();
            let meta = RustBackend::new().probe(&out).unwrap();
            assert_eq!(meta.format.as_deref(), Some(format.name()));
        }
    }

    #[test]
    fn normalize_orientation_without_tag_keeps_dimensions() {
        let backend = RustBackend::new();
        let bytes = encode_synthetic(ImageFormat::Jpeg, 120, 80);

        let out = backend.normalize_orientation(&bytes).unwrap();
        let meta = backend.probe(&out).unwrap();

        assert_eq!(meta.format.as_deref(), Some("jpeg"));
        assert_eq!(meta.dimensions(), Some(Dimensions { width: 120, height: 80 }));
    }

    #[test]
    fn normalize_orientation_rotates_tagged_jpeg() {
        let backend = RustBackend::new();
        let bytes = with_exif_orientation(&encode_synthetic(ImageFormat::Jpeg, 120, 80), 6);

        // Header dimensions ignore the tag
        let before = backend.probe(&bytes).unwrap();
        assert_eq!(before.dimensions(), Some(Dimensions { width: 120, height: 80 }));

        let out = backend.normalize_orientation(&bytes).unwrap();
        let meta = backend.probe(&out).unwrap();

        assert_eq!(meta.format.as_deref(), Some("jpeg"));
        assert_eq!(meta.dimensions(), Some(Dimensions { width: 80, height: 120 }));
    }

    #[test]
    fn optimize_with_auto_orientation_reports_rotated_size() {
        let backend = RustBackend::new();
        let bytes = with_exif_orientation(&encode_synthetic(ImageFormat::Jpeg, 120, 80), 6);
        // Low quality so the rotated re-encode is certain to be kept
        let options = OptimizeOptions {
            auto_orientation: true,
            quality: Quality::new(1),
            ..OptimizeOptions::default()
        };

        let result = optimize(&backend, &bytes, &options);
        let info = result.info.unwrap();

        assert_eq!((info.width, info.height), (80, 120));
        assert!(result.buffer.len() <= bytes.len());
    }

    #[test]
    fn encode_webp_over_size_limit_errors() {
        let img = synthetic_image(WEBP_MAX_DIMENSION + 1, 2);
        let result = encode_image(&img, OutputFormat::WebP, Quality::default());
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }

    #[test]
    fn full_size_webp_too_wide_is_no_variant() {
        let file = SourceFile::from_bytes("wide.png", encode_synthetic(ImageFormat::Png, 17000, 2));
        let outcome = create_webp(&RustBackend::new(), &file, Quality::default());
        assert_eq!(outcome, VariantOutcome::NoVariant);
    }

    #[test]
    fn format_name_is_lowercase() {
        assert_eq!(format_name(ImageFormat::Jpeg), "jpeg");
        assert_eq!(format_name(ImageFormat::Bmp), "bmp");
    }
}
