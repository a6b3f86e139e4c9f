//! Upload settings.
//!
//! Handles loading, validating, and merging `media-variants.toml`. Stock
//! defaults form the base layer; a user file overrides only the keys it sets.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [upload]
//! size_optimization = true      # Re-encode the original, keep the smaller
//! auto_orientation = false      # Apply EXIF orientation before re-encoding
//! responsive_dimensions = true  # Generate breakpoint variants
//!
//! [thumbnail]
//! max_width = 245
//! max_height = 156
//!
//! [encoding]
//! quality = 80                  # WebP / re-encode quality (1-100)
//!
//! [breakpoints]                 # label = max pixel dimension
//! large = 1000
//! medium = 750
//! small = 500
//!
//! [processing]
//! max_processes = 4             # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [encoding]
//! quality = 70
//! ```
//!
//! The one exception is `[breakpoints]`: a user table replaces the stock set
//! as a whole, so dropping a label is a matter of leaving it out.
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::imaging::{
    OptimizeOptions, Quality, ResponsiveConfig, ThumbnailConfig, default_breakpoints,
};

/// File name looked up in a directory by [`load_raw_config`].
pub const CONFIG_FILE_NAME: &str = "media-variants.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings for the upload pipeline, loaded from `media-variants.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadSettings {
    /// Which optional pipeline steps run.
    pub upload: UploadFlags,
    /// Thumbnail bounding box.
    pub thumbnail: ThumbnailSettings,
    /// Encoder settings shared by every variant and the optimizer.
    pub encoding: EncodingSettings,
    /// Responsive breakpoint set: label → max dimension.
    pub breakpoints: BTreeMap<String, u32>,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            upload: UploadFlags::default(),
            thumbnail: ThumbnailSettings::default(),
            encoding: EncodingSettings::default(),
            breakpoints: default_breakpoints(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl UploadSettings {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.encoding.quality) {
            return Err(ConfigError::Validation(
                "encoding.quality must be 1-100".into(),
            ));
        }
        if self.thumbnail.max_width == 0 || self.thumbnail.max_height == 0 {
            return Err(ConfigError::Validation(
                "thumbnail.max_width and thumbnail.max_height must be non-zero".into(),
            ));
        }
        if let Some((label, _)) = self.breakpoints.iter().find(|&(_, &max)| max == 0) {
            return Err(ConfigError::Validation(format!(
                "breakpoints.{label} must be non-zero"
            )));
        }
        Ok(())
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.encoding.quality)
    }

    pub fn thumbnail_config(&self) -> ThumbnailConfig {
        ThumbnailConfig {
            max_width: self.thumbnail.max_width,
            max_height: self.thumbnail.max_height,
            quality: self.quality(),
        }
    }

    pub fn responsive_config(&self) -> ResponsiveConfig {
        ResponsiveConfig {
            breakpoints: self.breakpoints.clone(),
            quality: self.quality(),
        }
    }

    pub fn optimize_options(&self) -> OptimizeOptions {
        OptimizeOptions {
            size_optimization: self.upload.size_optimization,
            auto_orientation: self.upload.auto_orientation,
            quality: self.quality(),
        }
    }
}

/// Pipeline switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadFlags {
    pub size_optimization: bool,
    pub auto_orientation: bool,
    pub responsive_dimensions: bool,
}

impl Default for UploadFlags {
    fn default() -> Self {
        Self {
            size_optimization: true,
            auto_orientation: false,
            responsive_dimensions: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailSettings {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        let stock = ThumbnailConfig::default();
        Self {
            max_width: stock.max_width,
            max_height: stock.max_height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingSettings {
    /// Encoder quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            quality: Quality::default().value(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default settings as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(UploadSettings::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge user settings over a base, replacing `breakpoints` wholesale.
pub fn merge_settings(mut base: toml::Value, overlay: toml::Value) -> toml::Value {
    let replaces_breakpoints = overlay.get("breakpoints").is_some();
    if let (true, Some(base_table)) = (replaces_breakpoints, base.as_table_mut()) {
        base_table.remove("breakpoints");
    }
    merge_toml(base, overlay)
}

/// Load `media-variants.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no such file.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(None);
    }
    read_toml(&config_path).map(Some)
}

fn read_toml(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<UploadSettings, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_settings(base, ov),
        None => base,
    };
    let config: UploadSettings = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load settings from `media-variants.toml` in the given directory, falling
/// back to stock defaults when the file is absent.
pub fn load_config(dir: &Path) -> Result<UploadSettings, ConfigError> {
    resolve_config(stock_defaults_value()?, load_raw_config(dir)?)
}

/// Load settings from an explicit file. A missing file is an error.
pub fn load_config_file(path: &Path) -> Result<UploadSettings, ConfigError> {
    resolve_config(stock_defaults_value()?, Some(read_toml(path)?))
}

/// Returns a fully-commented stock `media-variants.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# media-variants configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Pipeline steps
# ---------------------------------------------------------------------------
[upload]
# Re-encode the original in its own format and keep whichever is smaller.
size_optimization = true

# Rotate pixels according to the EXIF orientation tag before re-encoding.
auto_orientation = false

# Generate one WebP variant per applicable breakpoint.
responsive_dimensions = true

# ---------------------------------------------------------------------------
# Thumbnail
# ---------------------------------------------------------------------------
[thumbnail]
# Bounding box. Images already inside it get no thumbnail.
max_width = 245
max_height = 156

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[encoding]
# WebP and re-encode quality (1 = worst, 100 = best).
quality = 80

# ---------------------------------------------------------------------------
# Responsive breakpoints
# ---------------------------------------------------------------------------
# label = maximum pixel dimension, applied to both axes.
# A breakpoint is generated when it is smaller than the image's width or
# height. Setting this table replaces the whole default set.
[breakpoints]
large = 1000
medium = 750
small = 500

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
