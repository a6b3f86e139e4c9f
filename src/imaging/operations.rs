//! High-level variant operations.
//!
//! These functions combine calculations with backend execution. They decide
//! whether a variant should exist, call the backend, and package the result.
//!
//! Nothing here returns an error. Backend failures are logged at debug level
//! and degrade to an absent result for that one output:
//!
//! | Failure | Result |
//! |---|---|
//! | probe fails | empty [`Metadata`] |
//! | format not in the allow-list | [`VariantOutcome::Skipped`] / empty list |
//! | resize or encode fails | [`VariantOutcome::NoVariant`] / breakpoint omitted |
//! | optimizer fails | original buffer, no info |

use super::backend::{BackendError, Dimensions, ImageBackend, Metadata};
use super::calculations::{
    bytes_to_kbytes, exceeds_bounds, is_processable_format, plan_breakpoints,
};
use super::params::{EncodeParams, OutputFormat, Quality, ResizeSpec};
use crate::naming::{THUMBNAIL_PREFIX, variant_hash, variant_name};
use crate::types::{
    ImageInfo, OptimizedImage, ResponsiveVariant, SourceFile, VariantDescriptor, VariantOutcome,
};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Probe a buffer, degrading any failure to empty metadata.
pub fn probe(backend: &impl ImageBackend, bytes: &[u8]) -> Metadata {
    backend.probe(bytes).unwrap_or_else(|e| {
        debug!(error = %e, "probe failed");
        Metadata::default()
    })
}

/// Width and height of a buffer, if it can be probed.
pub fn dimensions(backend: &impl ImageBackend, bytes: &[u8]) -> Option<Dimensions> {
    probe(backend, bytes).dimensions()
}

/// Probe once and return the metadata only if the format is processable.
fn eligible_metadata(backend: &impl ImageBackend, bytes: &[u8]) -> Option<Metadata> {
    let meta = probe(backend, bytes);
    is_processable_format(meta.format.as_deref()).then_some(meta)
}

/// Whether a buffer's format allows derived variants (jpeg, png, webp, tiff).
pub fn is_eligible(backend: &impl ImageBackend, bytes: &[u8]) -> bool {
    eligible_metadata(backend, bytes).is_some()
}

/// Resize to fit inside `spec`; `None` when the backend fails.
pub fn resize_to_fit(
    backend: &impl ImageBackend,
    bytes: &[u8],
    spec: &ResizeSpec,
) -> Option<Vec<u8>> {
    backend
        .resize(bytes, spec)
        .map_err(|e| {
            debug!(
                error = %e,
                max_width = spec.max_width,
                max_height = spec.max_height,
                "resize failed"
            )
        })
        .ok()
}

/// Build the descriptor for a freshly encoded buffer.
fn describe(
    file: &SourceFile,
    prefix: Option<&str>,
    format: OutputFormat,
    dims: Dimensions,
    buffer: Vec<u8>,
) -> VariantDescriptor {
    VariantDescriptor {
        name: variant_name(prefix, &file.name),
        hash: variant_hash(prefix, &file.hash),
        ext: format.extension().to_string(),
        mime: format.mime().to_string(),
        width: dims.width,
        height: dims.height,
        size: bytes_to_kbytes(buffer.len() as u64),
        buffer,
        path: file.path.clone(),
    }
}

/// Encode to WebP, re-probe the output, and describe it.
fn render_webp(
    backend: &impl ImageBackend,
    file: &SourceFile,
    bytes: &[u8],
    prefix: Option<&str>,
    quality: Quality,
) -> Option<VariantDescriptor> {
    let params = EncodeParams {
        format: OutputFormat::WebP,
        quality,
    };
    let buffer = backend
        .encode(bytes, &params)
        .map_err(|e| debug!(file = %file.name, error = %e, "webp encode failed"))
        .ok()?;
    let Some(dims) = dimensions(backend, &buffer) else {
        debug!(file = %file.name, "encoded variant could not be probed");
        return None;
    };
    Some(describe(file, prefix, OutputFormat::WebP, dims, buffer))
}

/// Configuration for thumbnail generation.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: Quality,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_width: 245,
            max_height: 156,
            quality: Quality::default(),
        }
    }
}

/// Create a thumbnail variant.
///
/// Only images larger than the thumbnail box on at least one axis get a
/// thumbnail; smaller ones yield [`VariantOutcome::NoVariant`].
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    file: &SourceFile,
    config: &ThumbnailConfig,
) -> VariantOutcome {
    let Some(meta) = eligible_metadata(backend, &file.buffer) else {
        return VariantOutcome::Skipped;
    };
    let Some(original) = meta.dimensions() else {
        return VariantOutcome::NoVariant;
    };

    let bounds = Dimensions {
        width: config.max_width,
        height: config.max_height,
    };
    if !exceeds_bounds(original, bounds) {
        return VariantOutcome::NoVariant;
    }

    let spec = ResizeSpec::inside(config.max_width, config.max_height);
    let Some(resized) = resize_to_fit(backend, &file.buffer, &spec) else {
        return VariantOutcome::NoVariant;
    };

    match render_webp(backend, file, &resized, Some(THUMBNAIL_PREFIX), config.quality) {
        Some(descriptor) => VariantOutcome::Variant(descriptor),
        None => VariantOutcome::NoVariant,
    }
}

/// Re-encode the full-size image as WebP. Runs for every eligible source,
/// regardless of its size.
pub fn create_webp(
    backend: &impl ImageBackend,
    file: &SourceFile,
    quality: Quality,
) -> VariantOutcome {
    if !is_eligible(backend, &file.buffer) {
        return VariantOutcome::Skipped;
    }
    match render_webp(backend, file, &file.buffer, None, quality) {
        Some(descriptor) => VariantOutcome::Variant(descriptor),
        None => VariantOutcome::NoVariant,
    }
}

/// The breakpoint set used when configuration does not supply one.
pub fn default_breakpoints() -> BTreeMap<String, u32> {
    [("large", 1000), ("medium", 750), ("small", 500)]
        .into_iter()
        .map(|(label, max)| (label.to_string(), max))
        .collect()
}

/// Configuration for responsive breakpoint generation.
#[derive(Debug, Clone)]
pub struct ResponsiveConfig {
    /// Label → maximum pixel dimension (applied to both axes).
    pub breakpoints: BTreeMap<String, u32>,
    pub quality: Quality,
}

impl Default for ResponsiveConfig {
    fn default() -> Self {
        Self {
            breakpoints: default_breakpoints(),
            quality: Quality::default(),
        }
    }
}

/// Create one WebP variant per applicable breakpoint.
///
/// Breakpoints run in parallel; the result keeps breakpoint-set order. A
/// breakpoint that does not shrink the image, or whose resize/encode fails,
/// contributes no entry.
pub fn create_responsive_variants(
    backend: &impl ImageBackend,
    file: &SourceFile,
    config: &ResponsiveConfig,
    enabled: bool,
) -> Vec<ResponsiveVariant> {
    if !enabled {
        return Vec::new();
    }
    let Some(meta) = eligible_metadata(backend, &file.buffer) else {
        return Vec::new();
    };
    let Some(original) = meta.dimensions() else {
        return Vec::new();
    };

    plan_breakpoints(original, &config.breakpoints)
        .par_iter()
        .filter_map(|&(label, max)| {
            let resized = resize_to_fit(backend, &file.buffer, &ResizeSpec::square(max))?;
            let descriptor = render_webp(backend, file, &resized, Some(label), config.quality)?;
            Some(ResponsiveVariant {
                key: label.to_string(),
                file: descriptor,
            })
        })
        .collect()
}

/// Options for [`optimize`].
#[derive(Debug, Clone, Copy)]
pub struct OptimizeOptions {
    pub size_optimization: bool,
    pub auto_orientation: bool,
    pub quality: Quality,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            size_optimization: true,
            auto_orientation: false,
            quality: Quality::default(),
        }
    }
}

/// Re-encode in the source format and keep whichever buffer is smaller.
///
/// With both options off no re-encode happens at all: the input is returned
/// untouched with probed info, even where a plain re-encode would have come
/// out smaller. Any failure returns the original buffer with `info: None`. The
/// result is never larger than the input.
pub fn optimize(
    backend: &impl ImageBackend,
    bytes: &[u8],
    options: &OptimizeOptions,
) -> OptimizedImage {
    if !options.size_optimization && !options.auto_orientation {
        return OptimizedImage {
            buffer: bytes.to_vec(),
            info: image_info(backend, bytes),
        };
    }

    try_optimize(backend, bytes, options).unwrap_or_else(|e| {
        debug!(error = %e, "optimization failed, keeping original");
        OptimizedImage {
            buffer: bytes.to_vec(),
            info: None,
        }
    })
}

fn try_optimize(
    backend: &impl ImageBackend,
    bytes: &[u8],
    options: &OptimizeOptions,
) -> Result<OptimizedImage, BackendError> {
    let meta = backend.probe(bytes)?;
    let format_name = meta.format.unwrap_or_default();
    let format = OutputFormat::from_name(&format_name)
        .ok_or(BackendError::UnsupportedFormat(format_name))?;

    let oriented;
    let source = if options.auto_orientation {
        oriented = backend.normalize_orientation(bytes)?;
        oriented.as_slice()
    } else {
        bytes
    };

    let encoded = backend.encode(
        source,
        &EncodeParams {
            format,
            quality: options.quality,
        },
    )?;
    let buffer = if bytes.len() < encoded.len() {
        bytes.to_vec()
    } else {
        encoded
    };

    let info = image_info(backend, &buffer).ok_or_else(|| {
        BackendError::ProcessingFailed("optimized buffer could not be probed".into())
    })?;
    Ok(OptimizedImage {
        buffer,
        info: Some(info),
    })
}

fn image_info(backend: &impl ImageBackend, bytes: &[u8]) -> Option<ImageInfo> {
    let dims = dimensions(backend, bytes)?;
    Some(ImageInfo {
        width: dims.width,
        height: dims.height,
        size: bytes_to_kbytes(bytes.len() as u64),
    })
}
