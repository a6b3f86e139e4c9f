//! Image processing for derived variants.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Probe** | `image::ImageReader::with_guessed_format` + `into_dimensions` |
//! | **Resize** | Lanczos3 `resize_exact` to the fit-inside box |
//! | **Encode → WebP** | `webp::Encoder` (lossy, quality-controlled) |
//! | **Re-encode in place** | `image` JPEG/PNG/TIFF encoders |
//! | **Orientation** | `ImageDecoder::orientation` + `apply_orientation` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Variant entry points combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, Metadata};
pub use calculations::{
    PROCESSABLE_FORMATS, breakpoint_applies, bytes_to_kbytes, calculate_fit_inside,
    exceeds_bounds, is_processable_format, plan_breakpoints,
};
pub use operations::{
    OptimizeOptions, ResponsiveConfig, ThumbnailConfig, create_responsive_variants,
    create_thumbnail, create_webp, default_breakpoints, dimensions, is_eligible, optimize,
    probe, resize_to_fit,
};
pub use params::{EncodeParams, FitMode, OutputFormat, Quality, ResizeSpec};
pub use rust_backend::{RustBackend, format_name};
