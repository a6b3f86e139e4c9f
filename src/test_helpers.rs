//! Shared test utilities for the media-variants test suite.
//!
//! Real image buffers are generated on the fly rather than checked in as
//! fixtures: a gradient encodes to a realistic size in every codec and keeps
//! the tests independent of the filesystem.
//!
//! ```text
//! let bytes = encode_synthetic(ImageFormat::Png, 1000, 400);
//! let meta = RustBackend::new().probe(&bytes)?;
//! ```

use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;

/// An RGB gradient of the given size.
pub fn synthetic_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) % 256) as u8,
        ])
    });
    DynamicImage::ImageRgb8(img)
}

/// [`synthetic_image`] encoded in `format`. Panics if the codec is not compiled in.
pub fn encode_synthetic(format: ImageFormat, width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    synthetic_image(width, height)
        .write_to(&mut out, format)
        .unwrap_or_else(|e| panic!("encoding synthetic {format:?} failed: {e}"));
    out.into_inner()
}

/// Insert an EXIF APP1 segment carrying `orientation` right after the SOI
/// marker of a JPEG buffer.
pub fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG");

    // Big-endian TIFF header, one IFD with a single SHORT entry.
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM\x00\x2A");
    tiff.extend_from_slice(&8u32.to_be_bytes());
    tiff.extend_from_slice(&1u16.to_be_bytes());
    tiff.extend_from_slice(&0x0112u16.to_be_bytes());
    tiff.extend_from_slice(&3u16.to_be_bytes());
    tiff.extend_from_slice(&1u32.to_be_bytes());
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_be_bytes());

    let length = (2 + 6 + tiff.len()) as u16;
    let mut out = Vec::with_capacity(jpeg.len() + length as usize + 2);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(b"Exif\x00\x00");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}
