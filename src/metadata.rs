//! Capture metadata extraction from embedded EXIF.
//!
//! Three things are pulled from a source photo's EXIF block:
//!
//! - **Capture time**: `DateTimeOriginal` when the field is present, otherwise
//!   `DateTime`. Only the chosen field is parsed; if it does not parse, the
//!   photo is undated. Both use the EXIF `YYYY:MM:DD HH:MM:SS` form and carry
//!   no zone, so they are interpreted in the local time zone of the machine
//!   running the build.
//! - **Rotation**: from `Orientation`. See [`Rotation::from_orientation_tag`].
//! - **Tag map**: every primary-image field that has a scalar reading,
//!   keyed by tag name. This ends up verbatim in the album manifest.
//!
//! ## Tag map conversion
//!
//! | EXIF type | Kept as |
//! |---|---|
//! | ASCII | [`ExifValue::Text`], if valid UTF-8 without embedded NULs |
//! | BYTE, SHORT, LONG, SBYTE, SSHORT, SLONG | [`ExifValue::Integer`] (first value) |
//! | RATIONAL, SRATIONAL, FLOAT, DOUBLE | [`ExifValue::Float`] (first value) |
//! | UNDEFINED and unknown types | dropped |
//!
//! An ASCII value with an embedded NUL is kept as the empty string.
//!
//! Extraction never fails the image: a photo without EXIF, or with a
//! malformed block, simply gets default metadata.

use crate::types::{CaptureMetadata, ExifValue, Rotation};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use exif::{Exif, Field, In, Tag, Value};
use std::collections::BTreeMap;
use std::io::Cursor;
use thiserror::Error;

const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("no EXIF data")]
    Missing,
    #[error("malformed EXIF: {0}")]
    Malformed(exif::Error),
}

/// Parse the EXIF block of a JPEG held in memory.
pub fn read_exif(bytes: &[u8]) -> Result<Exif, MetadataError> {
    exif::Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .map_err(|e| match e {
            exif::Error::NotFound(_) => MetadataError::Missing,
            other => MetadataError::Malformed(other),
        })
}

/// Extract capture metadata from a source photo's bytes.
///
/// Missing or unreadable EXIF yields [`CaptureMetadata::default`].
pub fn extract_metadata(bytes: &[u8]) -> CaptureMetadata {
    match read_exif(bytes) {
        Ok(exif) => metadata_from_exif(&exif),
        Err(MetadataError::Missing) => CaptureMetadata::default(),
        Err(e) => {
            tracing::debug!("ignoring EXIF: {e}");
            CaptureMetadata::default()
        }
    }
}

fn metadata_from_exif(exif: &Exif) -> CaptureMetadata {
    let date_time = capture_time(exif);
    let orientation = exif
        .get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|f| f.value.get_uint(0));

    let tags = exif
        .fields()
        .filter(|f| f.ifd_num == In::PRIMARY)
        .filter_map(|f| tag_value(f).map(|v| (f.tag.to_string(), v)))
        .collect::<BTreeMap<_, _>>();

    CaptureMetadata {
        date_time,
        rotation: Rotation::from_orientation_tag(orientation),
        tags,
    }
}

fn capture_time(exif: &Exif) -> Option<DateTime<Local>> {
    let field = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .or_else(|| exif.get_field(Tag::DateTime, In::PRIMARY))?;
    let parsed = match tag_value(field) {
        Some(ExifValue::Text(s)) => parse_exif_datetime(&s),
        _ => None,
    };
    if parsed.is_none() {
        tracing::debug!("unparseable {}: {}", field.tag, field.display_value());
    }
    parsed
}

/// Parse an EXIF `YYYY:MM:DD HH:MM:SS` timestamp as local time. Trailing
/// NUL padding is ignored.
///
/// Returns `None` for unparseable strings and for local times that do not
/// exist (skipped by a DST transition). Ambiguous times take the earlier
/// instant.
pub fn parse_exif_datetime(s: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(s.trim_end_matches('\0'), EXIF_DATE_FORMAT).ok()?;
    Local.from_local_datetime(&naive).earliest()
}

fn tag_value(field: &Field) -> Option<ExifValue> {
    match &field.value {
        Value::Ascii(parts) => ascii_value(parts),
        Value::Byte(v) => v.first().map(|&n| ExifValue::Integer(n.into())),
        Value::Short(v) => v.first().map(|&n| ExifValue::Integer(n.into())),
        Value::Long(v) => v.first().map(|&n| ExifValue::Integer(n.into())),
        Value::SByte(v) => v.first().map(|&n| ExifValue::Integer(n.into())),
        Value::SShort(v) => v.first().map(|&n| ExifValue::Integer(n.into())),
        Value::SLong(v) => v.first().map(|&n| ExifValue::Integer(n.into())),
        Value::Rational(v) => v.first().map(|r| ExifValue::Float(r.to_f64())),
        Value::SRational(v) => v.first().map(|r| ExifValue::Float(r.to_f64())),
        Value::Float(v) => v.first().map(|&n| ExifValue::Float(n.into())),
        Value::Double(v) => v.first().map(|&n| ExifValue::Float(n)),
        _ => None,
    }
}

fn ascii_value(parts: &[Vec<u8>]) -> Option<ExifValue> {
    let mut parts = parts.to_vec();
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    match parts.as_slice() {
        [] => Some(ExifValue::Text(String::new())),
        [single] => String::from_utf8(single.clone()).ok().map(ExifValue::Text),
        _ => Some(ExifValue::Text(String::new())),
    }
}
