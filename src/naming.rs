//! Filename conventions shared by the scanner, planner and codec.
//!
//! A source `IMG_0042.jpg` produces `IMG_0042_small.jpg`,
//! `IMG_0042_large.jpg` (and `IMG_0042_medium.jpg` for the cover). Because
//! some galleries keep renditions next to their originals, the scanner must
//! recognise these names and never treat them as new sources.
//!
//! Matching is deliberately asymmetric, as it has always been:
//! - the `.jpg` extension check is case-insensitive (`DSC_1.JPG` is a source),
//! - the rendition suffix check is case-sensitive (only names this tool
//!   writes are skipped, so `holiday_Large.jpg` is still a source).

use crate::types::Label;
use std::path::Path;

const SOURCE_EXTENSION: &str = ".jpg";

/// True if `file_name` ends in `.jpg`, ignoring case.
pub fn has_jpeg_extension(file_name: &str) -> bool {
    file_name.to_lowercase().ends_with(SOURCE_EXTENSION)
}

/// True if `file_name` is one of our own outputs (`*_small.jpg`,
/// `*_medium.jpg`, `*_large.jpg`).
pub fn is_rendition_name(file_name: &str) -> bool {
    Label::ALL
        .iter()
        .any(|label| file_name.ends_with(&rendition_suffix(*label)))
}

fn rendition_suffix(label: Label) -> String {
    format!("_{}{}", label.as_str(), SOURCE_EXTENSION)
}

/// Source file name without its final extension (`a.b.jpg` → `a.b`).
pub fn source_stem(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Output file name for a label: `<stem>_<label>.jpg`.
pub fn rendition_file_name(source: &Path, label: Label) -> String {
    format!("{}{}", source_stem(source), rendition_suffix(label))
}

/// True if the lowercased base name of `source` equals `cover_file` lowercased.
pub fn is_cover(source: &Path, cover_file: &str) -> bool {
    source
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase() == cover_file.to_lowercase())
        .unwrap_or(false)
}
