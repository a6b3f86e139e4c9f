//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides which variants to create) and the [`backend`](super::backend)
//! (which does the actual pixel work). This separation allows swapping backends
//! (e.g. for testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 80). Clamped on construction.
//! - [`OutputFormat`]: the container formats the backend can encode.
//! - [`ResizeSpec`]: bounding box plus fit mode for a resize.
//! - [`EncodeParams`]: target format and quality for a re-encode.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Container formats the backend can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Tiff,
}

impl OutputFormat {
    /// Map a probed format name (`"jpeg"`, `"png"`, ...) to an output format.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Tiff => "tiff",
        }
    }

    /// File extension including the leading dot, as stored on descriptors.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => ".jpg",
            Self::Png => ".png",
            Self::WebP => ".webp",
            Self::Tiff => ".tiff",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Tiff => "image/tiff",
        }
    }
}

/// How a resized image relates to its bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Scale down until both axes fit, preserving aspect ratio. Never upscales.
    #[default]
    Inside,
}

/// Bounding box for a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSpec {
    pub max_width: u32,
    pub max_height: u32,
    pub fit: FitMode,
}

impl ResizeSpec {
    pub fn inside(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
            fit: FitMode::Inside,
        }
    }

    /// A square bound, as used for responsive breakpoints.
    pub fn square(max: u32) -> Self {
        Self::inside(max, max)
    }
}

/// Parameters for a re-encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeParams {
    pub format: OutputFormat,
    pub quality: Quality,
}
