//! Records passed between the caller and the variant core.
//!
//! [`SourceFile`] comes in; [`VariantDescriptor`]s (wrapped in
//! [`VariantOutcome`] or [`ResponsiveVariant`]) and [`OptimizedImage`] go out.
//! Descriptors serialize to JSON for the CLI manifest; image buffers are
//! skipped there and written as separate files.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// An uploaded file as supplied by the caller. Never mutated by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub buffer: Vec<u8>,
    /// Original file name, e.g. `"photo.png"`.
    pub name: String,
    /// Content-addressed identifier used to key stored variants.
    pub hash: String,
    pub path: Option<String>,
}

impl SourceFile {
    /// Build a source record whose hash is the SHA-256 of its contents.
    pub fn from_bytes(name: impl Into<String>, buffer: Vec<u8>) -> Self {
        let hash = content_hash(&buffer);
        Self {
            buffer,
            name: name.into(),
            hash,
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// SHA-256 of a buffer as lowercase hex.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// One generated artifact, ready for the caller to persist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantDescriptor {
    pub name: String,
    pub hash: String,
    /// Extension with the leading dot (`.webp`).
    pub ext: String,
    pub mime: String,
    pub width: u32,
    pub height: u32,
    /// Size of `buffer` in kilobytes (bytes / 1000, two decimals).
    pub size: f64,
    #[serde(skip)]
    pub buffer: Vec<u8>,
    pub path: Option<String>,
}

/// Result of a single-variant entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantOutcome {
    /// Source format is not eligible for derived variants.
    Skipped,
    /// Processing ran (or was unnecessary) but produced nothing usable.
    NoVariant,
    Variant(VariantDescriptor),
}

impl VariantOutcome {
    pub fn into_variant(self) -> Option<VariantDescriptor> {
        match self {
            Self::Variant(descriptor) => Some(descriptor),
            Self::Skipped | Self::NoVariant => None,
        }
    }

    pub fn as_variant(&self) -> Option<&VariantDescriptor> {
        match self {
            Self::Variant(descriptor) => Some(descriptor),
            Self::Skipped | Self::NoVariant => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

impl From<VariantOutcome> for Option<VariantDescriptor> {
    fn from(outcome: VariantOutcome) -> Self {
        outcome.into_variant()
    }
}

/// A responsive breakpoint variant, keyed by its breakpoint label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponsiveVariant {
    pub key: String,
    pub file: VariantDescriptor,
}

/// Dimensions and kilobyte size of an optimizer's retained buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub size: f64,
}

/// Output of the optimizer: the retained buffer plus what is known about it.
///
/// `info` is `None` when optimization failed and the original was returned
/// untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedImage {
    pub buffer: Vec<u8>,
    pub info: Option<ImageInfo>,
}
