//! Upload processing: optimize the original, then derive its variants.
//!
//! [`process_upload`] is the per-file pipeline a media service runs on every
//! upload. [`process_files`] drives it over files on disk in parallel and
//! reports progress; [`write_outputs`] persists the results.
//!
//! ## Pipeline
//!
//! ```text
//! original ──optimize──▶ retained buffer ──┬──▶ thumbnail (WebP, fit 245×156)
//!                                          ├──▶ full-size WebP copy
//!                                          └──▶ one WebP per breakpoint
//! ```
//!
//! Variants are derived from the optimized buffer, so auto-orientation
//! carries through to every variant.
//!
//! ## Output Structure
//!
//! ```text
//! out/
//! ├── manifest.json                      # One entry per upload
//! ├── original_<hash>.jpg                # Optimized original
//! ├── <hash>.webp                        # Full-size WebP copy
//! ├── thumbnail_<hash>.webp
//! ├── large_<hash>.webp
//! └── ...
//! ```
//!
//! ## Parallel Processing
//!
//! Files are processed in parallel using [rayon](https://docs.rs/rayon); the
//! caller sizes the global pool (see [`crate::config::effective_threads`]).

use crate::config::UploadSettings;
use crate::imaging::{
    ImageBackend, create_responsive_variants, create_thumbnail, create_webp, optimize,
};
use crate::types::{ImageInfo, ResponsiveVariant, SourceFile, VariantDescriptor, VariantOutcome};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),
}

/// Everything produced for one upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedUpload {
    /// The source record with its buffer replaced by the optimizer's choice.
    pub file: SourceFile,
    /// Dimensions and size of `file.buffer`; `None` if optimization failed.
    pub info: Option<ImageInfo>,
    pub thumbnail: VariantOutcome,
    pub webp: VariantOutcome,
    pub responsive: Vec<ResponsiveVariant>,
}

/// Run the full variant pipeline on one upload.
pub fn process_upload(
    backend: &impl ImageBackend,
    source: &SourceFile,
    settings: &UploadSettings,
) -> ProcessedUpload {
    let optimized = optimize(backend, &source.buffer, &settings.optimize_options());
    let file = SourceFile {
        buffer: optimized.buffer,
        ..source.clone()
    };

    let thumbnail = create_thumbnail(backend, &file, &settings.thumbnail_config());
    let webp = create_webp(backend, &file, settings.quality());
    let responsive = create_responsive_variants(
        backend,
        &file,
        &settings.responsive_config(),
        settings.upload.responsive_dimensions,
    );

    info!(
        file = %file.name,
        original_bytes = source.buffer.len(),
        retained_bytes = file.buffer.len(),
        thumbnail = thumbnail.as_variant().is_some(),
        webp = webp.as_variant().is_some(),
        responsive = responsive.len(),
        "processed upload"
    );

    ProcessedUpload {
        file,
        info: optimized.info,
        thumbnail,
        webp,
        responsive,
    }
}

// ============================================================================
// Progress events
// ============================================================================

/// Progress reported by [`process_files`] while it runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    BatchStarted {
        file_count: usize,
    },
    FileProcessed {
        /// 1-based position in the input list.
        index: usize,
        source_path: String,
        original: Option<ImageInfo>,
        variants: Vec<VariantInfo>,
    },
    FileFailed {
        index: usize,
        source_path: String,
        error: String,
    },
}

/// Status of one variant of a processed file.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantInfo {
    pub label: String,
    pub status: VariantStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VariantStatus {
    Created { width: u32, height: u32, size: f64 },
    /// The image is already small enough, or generation failed.
    NotNeeded,
    /// The source format is not eligible for variants.
    Skipped,
}

impl VariantStatus {
    fn from_outcome(outcome: &VariantOutcome) -> Self {
        match outcome {
            VariantOutcome::Variant(d) => Self::created(d),
            VariantOutcome::NoVariant => Self::NotNeeded,
            VariantOutcome::Skipped => Self::Skipped,
        }
    }

    fn created(descriptor: &VariantDescriptor) -> Self {
        Self::Created {
            width: descriptor.width,
            height: descriptor.height,
            size: descriptor.size,
        }
    }
}

impl ProcessedUpload {
    /// Per-variant status lines: thumbnail, full-size WebP, then breakpoints.
    pub fn variant_infos(&self) -> Vec<VariantInfo> {
        let mut infos = vec![
            VariantInfo {
                label: "thumbnail".to_string(),
                status: VariantStatus::from_outcome(&self.thumbnail),
            },
            VariantInfo {
                label: "webp".to_string(),
                status: VariantStatus::from_outcome(&self.webp),
            },
        ];
        infos.extend(self.responsive.iter().map(|v| VariantInfo {
            label: v.key.clone(),
            status: VariantStatus::created(&v.file),
        }));
        infos
    }
}

// ============================================================================
// Batch processing
// ============================================================================

/// Expand inputs into a flat file list. Directories are walked recursively
/// in file-name order.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, ProcessError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(ProcessError::InputNotFound(input.clone()));
        }
    }
    Ok(files)
}

/// Read a file into a [`SourceFile`]: name from the file name, hash from the
/// contents, path from the parent directory.
pub fn load_source(path: &Path) -> Result<SourceFile, ProcessError> {
    let buffer = fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let source = SourceFile::from_bytes(name, buffer);
    Ok(match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => source.with_path(parent.to_string_lossy()),
        None => source,
    })
}

/// A file that could not be read.
#[derive(Debug)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: ProcessError,
}

/// Result of a batch run, in input order.
#[derive(Debug, Default)]
pub struct ProcessResult {
    pub uploads: Vec<ProcessedUpload>,
    pub failures: Vec<FailedFile>,
}

/// Process files in parallel, sending a [`ProcessEvent`] per file.
///
/// A file that cannot be read is recorded as a failure and does not stop the
/// batch. Image problems never fail a file; they only drop variants.
pub fn process_files(
    backend: &impl ImageBackend,
    paths: &[PathBuf],
    settings: &UploadSettings,
    progress: Option<Sender<ProcessEvent>>,
) -> ProcessResult {
    let emit = |event: ProcessEvent| {
        if let Some(tx) = progress.as_ref() {
            tx.send(event).ok();
        }
    };

    emit(ProcessEvent::BatchStarted {
        file_count: paths.len(),
    });

    let results: Vec<Result<ProcessedUpload, FailedFile>> = paths
        .par_iter()
        .enumerate()
        .map(|(i, path)| {
            let index = i + 1;
            let source_path = path.display().to_string();
            match load_source(path) {
                Ok(source) => {
                    let upload = process_upload(backend, &source, settings);
                    emit(ProcessEvent::FileProcessed {
                        index,
                        source_path,
                        original: upload.info,
                        variants: upload.variant_infos(),
                    });
                    Ok(upload)
                }
                Err(error) => {
                    warn!(path = %source_path, error = %error, "could not read input");
                    emit(ProcessEvent::FileFailed {
                        index,
                        source_path,
                        error: error.to_string(),
                    });
                    Err(FailedFile {
                        path: path.clone(),
                        error,
                    })
                }
            }
        })
        .collect();

    let mut result = ProcessResult::default();
    for r in results {
        match r {
            Ok(upload) => result.uploads.push(upload),
            Err(failed) => result.failures.push(failed),
        }
    }
    result
}

// ============================================================================
// Writing results
// ============================================================================

/// One manifest entry per upload. Buffers are written as separate files.
#[derive(Debug, Serialize)]
pub struct ManifestEntry {
    pub name: String,
    pub hash: String,
    pub path: Option<String>,
    /// File name of the optimized original within the output directory.
    pub original: String,
    pub info: Option<ImageInfo>,
    pub thumbnail: Option<VariantDescriptor>,
    pub webp: Option<VariantDescriptor>,
    pub responsive: Vec<ResponsiveVariant>,
}

fn stored_name(descriptor: &VariantDescriptor) -> String {
    format!("{}{}", descriptor.hash, descriptor.ext)
}

/// Prefix on the stored original. The unprefixed `<hash>.webp` belongs to the
/// full-size WebP copy, which a `.webp` upload would otherwise collide with.
const ORIGINAL_PREFIX: &str = "original";

fn original_name(file: &SourceFile) -> String {
    match Path::new(&file.name).extension() {
        Some(ext) => format!("{ORIGINAL_PREFIX}_{}.{}", file.hash, ext.to_string_lossy()),
        None => format!("{ORIGINAL_PREFIX}_{}", file.hash),
    }
}

/// Write the original as `original_<hash><ext>`, every variant as
/// `<hash><ext>`, plus a `manifest.json` describing them.
///
/// Returns the manifest path.
pub fn write_outputs(
    output_dir: &Path,
    uploads: &[ProcessedUpload],
) -> Result<PathBuf, ProcessError> {
    fs::create_dir_all(output_dir)?;

    let mut entries = Vec::with_capacity(uploads.len());
    for upload in uploads {
        let original = original_name(&upload.file);
        fs::write(output_dir.join(&original), &upload.file.buffer)?;

        let variants = upload
            .thumbnail
            .as_variant()
            .into_iter()
            .chain(upload.webp.as_variant())
            .chain(upload.responsive.iter().map(|v| &v.file));
        for descriptor in variants {
            fs::write(output_dir.join(stored_name(descriptor)), &descriptor.buffer)?;
        }

        entries.push(ManifestEntry {
            name: upload.file.name.clone(),
            hash: upload.file.hash.clone(),
            path: upload.file.path.clone(),
            original,
            info: upload.info,
            thumbnail: upload.thumbnail.as_variant().cloned(),
            webp: upload.webp.as_variant().cloned(),
            responsive: upload.responsive.clone(),
        });
    }

    let manifest_path = output_dir.join("manifest.json");
    fs::write(&manifest_path, serde_json::to_string_pretty(&entries)?)?;
    Ok(manifest_path)
}
