//! Pure calculation functions for dimension math and size reporting.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use std::collections::BTreeMap;

/// Source formats eligible for derived-variant generation.
pub const PROCESSABLE_FORMATS: &[&str] = &["jpeg", "png", "webp", "tiff"];

/// Whether a probed format name is in the processable allow-list.
pub fn is_processable_format(format: Option<&str>) -> bool {
    format.is_some_and(|f| PROCESSABLE_FORMATS.contains(&f))
}

/// Calculate the output dimensions for a fit-inside resize.
///
/// Scales the source down so both axes fit within `bounds`, preserving the
/// aspect ratio. Sources already within bounds are returned unchanged; this
/// never upscales. Each axis is at least 1px.
///
/// # Examples
/// ```
/// # use media_variants::imaging::calculate_fit_inside;
/// # use media_variants::imaging::Dimensions;
/// let out = calculate_fit_inside(
///     Dimensions { width: 1000, height: 400 },
///     Dimensions { width: 245, height: 156 },
/// );
/// assert_eq!((out.width, out.height), (245, 98));
/// ```
pub fn calculate_fit_inside(source: Dimensions, bounds: Dimensions) -> Dimensions {
    if source.width <= bounds.width && source.height <= bounds.height {
        return source;
    }

    let scale_w = bounds.width as f64 / source.width as f64;
    let scale_h = bounds.height as f64 / source.height as f64;
    let scale = scale_w.min(scale_h);

    let width = ((source.width as f64 * scale).round() as u32).clamp(1, bounds.width.max(1));
    let height = ((source.height as f64 * scale).round() as u32).clamp(1, bounds.height.max(1));
    Dimensions { width, height }
}

/// Whether an image is larger than the given bounds on either axis.
///
/// The check is an OR: a 300×100 image exceeds 245×156 even though its
/// height fits.
pub fn exceeds_bounds(original: Dimensions, bounds: Dimensions) -> bool {
    original.width > bounds.width || original.height > bounds.height
}

/// Whether a breakpoint would shrink the original on at least one axis.
///
/// The single breakpoint scalar is compared against both width and height.
pub fn breakpoint_applies(breakpoint: u32, original: Dimensions) -> bool {
    breakpoint < original.width || breakpoint < original.height
}

/// Select the breakpoints that would shrink the original, in set order.
///
/// Breakpoints at or above both dimensions are dropped; there is no
/// fallback entry when nothing applies.
pub fn plan_breakpoints(
    original: Dimensions,
    breakpoints: &BTreeMap<String, u32>,
) -> Vec<(&str, u32)> {
    breakpoints
        .iter()
        .filter(|&(_, &max)| breakpoint_applies(max, original))
        .map(|(label, &max)| (label.as_str(), max))
        .collect()
}

/// Convert a byte count to kilobytes (divisor 1000), rounded to two decimals.
pub fn bytes_to_kbytes(bytes: u64) -> f64 {
    ((bytes as f64 / 1000.0) * 100.0).round() / 100.0
}
