//! # media-variants
//!
//! Derived image variants for a media-upload pipeline. Given an uploaded image
//! buffer, the crate produces:
//!
//! - a **thumbnail** (WebP, fit inside 245×156) when the image is larger than that box,
//! - a **full-size WebP copy** of every eligible upload,
//! - **responsive variants**, one WebP per breakpoint smaller than the image,
//! - a **size-optimized original**: re-encoded in its own format, with the smaller buffer kept.
//!
//! Each variant comes with a descriptor (name, hash, ext, mime, width, height,
//! size in kB) ready for the caller to persist.
//!
//! # Architecture
//!
//! ```text
//! SourceFile ──▶ process_upload ──▶ optimize ──▶ create_thumbnail
//!                                             ├─▶ create_webp
//!                                             └─▶ create_responsive_variants (rayon)
//!                                                          │
//!                                        ImageBackend (probe/resize/encode/orient)
//! ```
//!
//! The variant core never fails. A probe that cannot read a buffer yields
//! empty metadata, a resize or encode that fails yields no variant for that
//! output only, and formats outside `{jpeg, png, webp, tiff}` are skipped on
//! purpose. Swallowed errors are logged with `tracing` at debug level.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Backend trait, `image`-crate backend, dimension math, variant operations |
//! | [`process`] | Per-upload pipeline, parallel batch over files, output writing |
//! | [`config`] | `media-variants.toml` loading, merging, and validation |
//! | [`types`] | Records exchanged with callers (`SourceFile`, `VariantDescriptor`, ...) |
//! | [`naming`] | Variant name/hash derivation, including the `.png` → `.webp` rewrite |
//! | [`output`] | CLI output formatting |

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
