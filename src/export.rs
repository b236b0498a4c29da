//! `album.toml` serialization.
//!
//! Hugo templates read the manifest from `data/album/<slug>/album.toml`.
//! Key names are fixed by those templates:
//!
//! ```toml
//! Path = "/home/me/photos/2020-iceland"
//! Slug = "iceland"
//!
//! [[Images]]
//! Path = "/home/me/photos/2020-iceland/cover.jpg"
//! DateTime = 2020-01-02T10:00:00Z
//!
//! [Images.Small]
//! RelativeURL = "album/iceland/cover_small.jpg"
//! Width = 600
//! Height = 450
//!
//! [Images.Exif]
//! Make = "FUJIFILM"
//! Orientation = 1
//! ```
//!
//! `DateTime` is a native TOML datetime carrying the local offset, omitted for
//! undated photos. Rendition tables appear only for labels that were produced;
//! labels that failed are listed in `Failed`.

use crate::cache::CacheStats;
use crate::process::{AlbumRun, ProcessError};
use crate::types::{AlbumManifest, ExifValue, ImageRecord, Label, RenditionResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

const ALBUM_FILENAME: &str = "album.toml";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AlbumDocument {
    pub path: String,
    pub slug: String,
    pub images: Vec<ImageDocument>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageDocument {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<toml::value::Datetime>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small: Option<RenditionDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium: Option<RenditionDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large: Option<RenditionDocument>,
    pub exif: BTreeMap<String, ExifDocument>,
}

#[derive(Debug, Serialize)]
pub struct RenditionDocument {
    #[serde(rename = "RelativeURL")]
    pub relative_url: String,
    #[serde(rename = "Width")]
    pub width: u32,
    #[serde(rename = "Height")]
    pub height: u32,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ExifDocument {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<&RenditionResult> for RenditionDocument {
    fn from(r: &RenditionResult) -> Self {
        Self {
            relative_url: r.relative_url.clone(),
            width: r.width,
            height: r.height,
        }
    }
}

impl From<&ExifValue> for ExifDocument {
    fn from(v: &ExifValue) -> Self {
        match v {
            ExifValue::Text(s) => ExifDocument::Text(s.clone()),
            ExifValue::Integer(n) => ExifDocument::Integer(*n),
            ExifValue::Float(f) => ExifDocument::Float(*f),
        }
    }
}

fn image_document(record: &ImageRecord) -> ImageDocument {
    let rendition = |label| record.renditions.get(&label).map(RenditionDocument::from);
    ImageDocument {
        path: record.source_path.display().to_string(),
        date_time: record
            .metadata
            .date_time
            .and_then(|dt| dt.to_rfc3339().parse().ok()),
        failed: record.failed.keys().map(|l| l.to_string()).collect(),
        small: rendition(Label::Small),
        medium: rendition(Label::Medium),
        large: rendition(Label::Large),
        exif: record
            .metadata
            .tags
            .iter()
            .map(|(k, v)| (k.clone(), ExifDocument::from(v)))
            .collect(),
    }
}

/// Build the serializable document for a manifest.
pub fn album_document(manifest: &AlbumManifest) -> AlbumDocument {
    AlbumDocument {
        path: manifest.source_dir.display().to_string(),
        slug: manifest.slug.clone(),
        images: manifest.images.iter().map(image_document).collect(),
    }
}

pub fn to_toml_string(manifest: &AlbumManifest) -> Result<String, ExportError> {
    Ok(toml::to_string(&album_document(manifest))?)
}

/// Write `<data_root>/<slug>/album.toml`, replacing any previous file.
pub fn write_album_toml(data_root: &Path, manifest: &AlbumManifest) -> Result<PathBuf, ExportError> {
    let dir = data_root.join(&manifest.slug);
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(ALBUM_FILENAME);
    std::fs::write(&path, to_toml_string(manifest)?)?;
    tracing::info!("wrote {}", path.display());
    Ok(path)
}

/// Outcome of exporting a batch of album runs.
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub written: Vec<PathBuf>,
    /// Albums that failed to process or whose manifest could not be written.
    pub failed: usize,
    /// Cache statistics summed over the albums that processed.
    pub stats: CacheStats,
}

/// Write `album.toml` for every album that processed. A failed write is
/// logged and counted; the remaining albums are still written.
pub fn write_album_tomls(
    data_root: &Path,
    results: Vec<Result<AlbumRun, ProcessError>>,
) -> ExportSummary {
    let mut summary = ExportSummary::default();
    for result in results {
        let Ok(run) = result else {
            summary.failed += 1;
            continue;
        };
        summary.stats.merge(&run.stats);
        match write_album_toml(data_root, &run.manifest) {
            Ok(path) => summary.written.push(path),
            Err(e) => {
                tracing::error!("album {}: cannot write {ALBUM_FILENAME}: {e}", run.manifest.slug);
                summary.failed += 1;
            }
        }
    }
    summary
}
