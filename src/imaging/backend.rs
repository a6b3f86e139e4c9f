//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four operations every backend must
//! support: probe, resize, encode, and normalize_orientation. All of them work
//! on in-memory buffers; nothing here touches the filesystem.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Backends report failures as [`BackendError`]; deciding what a failure
//! *means* (usually "no variant") is left to [`operations`](super::operations).

use super::params::{EncodeParams, ResizeSpec};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unrecognized image format")]
    UnknownFormat,
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// What a probe learned about a buffer.
///
/// Every field is optional: a failed probe degrades to
/// [`Metadata::default()`] rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Lowercase container name: `jpeg`, `png`, `webp`, `tiff`, `gif`, ...
    pub format: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Buffer length in bytes.
    pub size: Option<u64>,
}

impl Metadata {
    /// Width and height together, if both are known.
    pub fn dimensions(&self) -> Option<Dimensions> {
        Some(Dimensions {
            width: self.width?,
            height: self.height?,
        })
    }
}

/// Trait for image codec backends.
///
/// `Sync` so one backend can be shared across rayon workers.
pub trait ImageBackend: Sync {
    /// Read format, dimensions and byte size without a full decode.
    fn probe(&self, bytes: &[u8]) -> Result<Metadata, BackendError>;

    /// Resize to fit inside `spec`. The output keeps the source format.
    fn resize(&self, bytes: &[u8], spec: &ResizeSpec) -> Result<Vec<u8>, BackendError>;

    /// Decode and re-encode into the requested format and quality.
    fn encode(&self, bytes: &[u8], params: &EncodeParams) -> Result<Vec<u8>, BackendError>;

    /// Apply the embedded orientation tag to the pixels. The output keeps the
    /// source format and carries no orientation tag.
    fn normalize_orientation(&self, bytes: &[u8]) -> Result<Vec<u8>, BackendError>;
}
