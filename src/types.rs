//! Shared types produced by the pipeline.
//!
//! Everything here is a plain value: records are built by a file task, handed
//! to the album scheduler over the join channel, and never mutated after the
//! manifest is assembled.

use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Size label of a rendition.
///
/// Declaration order is the order labels appear in manifests and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    Small,
    Medium,
    Large,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::Small, Label::Medium, Label::Large];

    /// Lowercase name used in output filenames (`photo_small.jpg`).
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Small => "small",
            Label::Medium => "medium",
            Label::Large => "large",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An album to process: where its originals live and what to call it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumSource {
    pub slug: String,
    pub source_dir: PathBuf,
}

/// One produced (or reused) rendition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenditionResult {
    /// Path relative to the static root, `/`-separated, with the URL prefix.
    pub relative_url: String,
    pub width: u32,
    pub height: u32,
}

/// A scalar EXIF value kept in the generic tag map.
#[derive(Debug, Clone, PartialEq)]
pub enum ExifValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

/// Rotation needed to display an image upright, derived from the EXIF
/// `Orientation` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    /// Tag 6: rotate 90° clockwise.
    Clockwise90,
    /// Tag 8: rotate 90° counter-clockwise.
    CounterClockwise90,
    /// Tag 3: rotate 180°.
    Half,
}

impl Rotation {
    /// Map an EXIF orientation value. Mirrored orientations (2, 4, 5, 7) and
    /// anything unknown are treated as upright.
    pub fn from_orientation_tag(tag: Option<u32>) -> Self {
        match tag {
            Some(3) => Rotation::Half,
            Some(6) => Rotation::Clockwise90,
            Some(8) => Rotation::CounterClockwise90,
            _ => Rotation::None,
        }
    }

    /// Signed angle in degrees: 0, 90, -90 or 180.
    pub fn degrees(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 90,
            Rotation::CounterClockwise90 => -90,
            Rotation::Half => 180,
        }
    }

    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Clockwise90 | Rotation::CounterClockwise90)
    }
}

/// Metadata pulled from a photo's embedded EXIF block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaptureMetadata {
    pub date_time: Option<DateTime<Local>>,
    pub rotation: Rotation,
    pub tags: BTreeMap<String, ExifValue>,
}

/// Everything known about one source photo after its task completes.
///
/// `renditions` and `failed` together always cover exactly the labels the
/// planner selected for this file.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub source_path: PathBuf,
    pub metadata: CaptureMetadata,
    pub renditions: BTreeMap<Label, RenditionResult>,
    /// Labels that could not be produced, with the error that stopped them.
    pub failed: BTreeMap<Label, String>,
}

impl ImageRecord {
    pub fn labels(&self) -> Vec<Label> {
        self.renditions.keys().copied().collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Ordered description of one album run.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumManifest {
    pub source_dir: PathBuf,
    pub slug: String,
    /// Sorted by capture time; undated images last, in listing order.
    pub images: Vec<ImageRecord>,
}
