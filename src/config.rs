//! Pipeline configuration.
//!
//! Handles loading, validating, and merging `renditions.toml`. Stock defaults
//! reproduce the Hugo album layout; a user file at the site root overrides any
//! subset of them.
//!
//! ## Config File Location
//!
//! ```text
//! my-hugo-site/
//! ├── renditions.toml          # optional, overrides stock defaults
//! ├── content/album/*.md       # album pages with `album = "/path/to/originals"`
//! ├── data/album/<slug>/       # album.toml written here
//! └── static/album/<slug>/     # renditions written here
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! content_dir = "content/album"   # album pages with front matter
//! static_root = "static/album"    # renditions go to <static_root>/<slug>/
//! data_root = "data/album"        # album.toml goes to <data_root>/<slug>/
//! url_prefix = "album"            # prepended to URLs relative to static_root
//!
//! [renditions]
//! cover_file = "cover.jpg"        # also gets a medium rendition
//!
//! [renditions.small]
//! width = 600
//! quality = 80
//!
//! [renditions.medium]
//! width = 800
//! quality = 80
//!
//! [renditions.large]
//! width = 1536
//! quality = 80
//!
//! [processing]
//! max_processes = 4               # omit for auto = CPU cores
//! ```
//!
//! Relative paths are resolved against the site root. Unknown keys are
//! rejected to catch typos early.

use crate::types::Label;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the site root.
pub const CONFIG_FILENAME: &str = "renditions.toml";

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

/// Pipeline configuration loaded from `renditions.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Where albums are discovered and where outputs are written.
    pub paths: PathsConfig,
    /// Rendition widths, qualities and the cover file rule.
    pub renditions: RenditionsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for label in Label::ALL {
            let size = self.renditions.size(label);
            if size.width == 0 {
                return Err(ConfigError::Validation(format!(
                    "renditions.{label}.width must be greater than 0"
                )));
            }
            if !(1..=100).contains(&size.quality) {
                return Err(ConfigError::Validation(format!(
                    "renditions.{label}.quality must be 1-100"
                )));
            }
        }
        if self.renditions.cover_file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "renditions.cover_file must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Filesystem layout, relative to the site root unless absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub content_dir: PathBuf,
    pub static_root: PathBuf,
    pub data_root: PathBuf,
    pub url_prefix: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content/album"),
            static_root: PathBuf::from("static/album"),
            data_root: PathBuf::from("data/album"),
            url_prefix: "album".to_string(),
        }
    }
}

impl PathsConfig {
    /// Resolve every directory against `site_root`. Absolute paths pass
    /// through unchanged.
    pub fn resolve(&self, site_root: &Path) -> PathsConfig {
        PathsConfig {
            content_dir: site_root.join(&self.content_dir),
            static_root: site_root.join(&self.static_root),
            data_root: site_root.join(&self.data_root),
            url_prefix: self.url_prefix.clone(),
        }
    }
}

/// Width and JPEG quality of one rendition label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeConfig {
    pub width: u32,
    pub quality: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenditionsConfig {
    /// File name (compared case-insensitively) that marks the album cover.
    pub cover_file: String,
    pub small: SizeConfig,
    pub medium: SizeConfig,
    pub large: SizeConfig,
}

impl Default for RenditionsConfig {
    fn default() -> Self {
        Self {
            cover_file: "cover.jpg".to_string(),
            small: SizeConfig {
                width: 600,
                quality: 80,
            },
            medium: SizeConfig {
                width: 800,
                quality: 80,
            },
            large: SizeConfig {
                width: 1536,
                quality: 80,
            },
        }
    }
}

impl RenditionsConfig {
    pub fn size(&self, label: Label) -> SizeConfig {
        match label {
            Label::Small => self.small,
            Label::Medium => self.medium,
            Label::Large => self.large,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of worker threads shared by album and file tasks.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, never less than one
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

/// Returns the stock default config as a `toml::Value::Table`, the base layer
/// user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PipelineConfig::default())?)
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

/// Load `renditions.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(site_root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = site_root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config for a site root: stock defaults plus `renditions.toml`.
pub fn load_config(site_root: &Path) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(site_root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `renditions.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# photo-renditions configuration
# ==============================
# All settings are optional. Values shown below are the defaults.
# Relative paths are resolved against the site root (--site).
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Paths
# ---------------------------------------------------------------------------
[paths]
# Album pages; each page's front matter names its source directory:
#   album = "/home/me/photos/2020-iceland"
content_dir = "content/album"

# Renditions are written to <static_root>/<slug>/<name>_<label>.jpg
static_root = "static/album"

# The album manifest is written to <data_root>/<slug>/album.toml
data_root = "data/album"

# Prefix for rendition URLs, which are relative to static_root.
url_prefix = "album"

# ---------------------------------------------------------------------------
# Renditions
# ---------------------------------------------------------------------------
[renditions]
# Every photo gets small and large. The cover (matched case-insensitively)
# also gets medium.
cover_file = "cover.jpg"

[renditions.small]
width = 600
quality = 80

[renditions.medium]
width = 800
quality = 80

[renditions.large]
width = 1536
quality = 80

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum worker threads. Omit to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
