//! Naming convention for derived variants.
//!
//! Every variant is keyed by a prefix plus the source's name and hash:
//!
//! - thumbnail: `thumbnail_photo.webp` / `thumbnail_<hash>`
//! - responsive: `large_photo.webp` / `large_<hash>`
//! - full-size WebP copy: `photo.webp` / `<hash>` (no prefix)
//!
//! ## The `.png` rewrite
//!
//! Only the first `.png` in a name is rewritten to `.webp`. Other extensions
//! are left alone even though the variant itself is always WebP, so
//! `photo.jpg` becomes `thumbnail_photo.jpg` with `ext = ".webp"`. Stored
//! variants are keyed by hash + ext, so the display name keeps the upload's
//! original extension for everything except PNG.

/// The label prefixed to thumbnail names and hashes.
pub const THUMBNAIL_PREFIX: &str = "thumbnail";

/// Rewrite the first `.png` occurrence to `.webp`.
pub fn webp_file_name(name: &str) -> String {
    name.replacen(".png", ".webp", 1)
}

/// Display name for a variant; `None` means the unprefixed full-size copy.
pub fn variant_name(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(p) => format!("{}_{}", p, webp_file_name(name)),
        None => webp_file_name(name),
    }
}

/// Storage hash for a variant; `None` means the unprefixed full-size copy.
pub fn variant_hash(prefix: Option<&str>, hash: &str) -> String {
    match prefix {
        Some(p) => format!("{}_{}", p, hash),
        None => hash.to_string(),
    }
}
