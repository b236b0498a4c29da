//! Shared test utilities: synthetic JPEGs with optional EXIF.
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let exif = TestExif {
//!     orientation: Some(6),
//!     date_time_original: Some("2020:01:02 10:00:00"),
//!     ..TestExif::default()
//! };
//! std::fs::write(dir.join("a.jpg"), jpeg_with_exif(800, 600, &exif)).unwrap();
//! ```

use image::codecs::jpeg::JpegEncoder;
use image::{ImageEncoder, Rgb, RgbImage};
use std::path::Path;

// =========================================================================
// Plain JPEGs
// =========================================================================

/// Encode a gradient JPEG of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Vec::new();
    JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Write a gradient JPEG to `path`.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::write(path, jpeg_bytes(width, height)).unwrap();
}

// =========================================================================
// EXIF
// =========================================================================

/// Tags to embed in a synthetic EXIF block.
#[derive(Debug, Clone, Default)]
pub struct TestExif {
    pub orientation: Option<u16>,
    pub make: Option<&'static str>,
    pub date_time: Option<&'static str>,
    pub date_time_original: Option<&'static str>,
    /// `FNumber` as a RATIONAL (numerator, denominator), in the Exif sub-IFD.
    pub f_number: Option<(u32, u32)>,
}

/// A JPEG of the given size carrying `exif` in an APP1 segment.
pub fn jpeg_with_exif(width: u32, height: u32, exif: &TestExif) -> Vec<u8> {
    insert_app1(&jpeg_bytes(width, height), &tiff_block(exif))
}

/// Insert an `Exif\0\0` APP1 segment right after SOI.
pub fn insert_app1(jpeg: &[u8], tiff: &[u8]) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG");
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(tiff);
    let len = (payload.len() + 2) as u16;

    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;

const TAG_MAKE: u16 = 0x010F;
const TAG_ORIENTATION: u16 = 0x0112;
const TAG_DATE_TIME: u16 = 0x0132;
const TAG_F_NUMBER: u16 = 0x829D;
const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;

struct Entry {
    tag: u16,
    typ: u16,
    count: u32,
    /// Inline value (<= 4 bytes, left-aligned) or out-of-line data.
    data: Vec<u8>,
}

impl Entry {
    fn ascii(tag: u16, s: &str) -> Self {
        let mut data = s.as_bytes().to_vec();
        data.push(0);
        Self {
            tag,
            typ: TYPE_ASCII,
            count: data.len() as u32,
            data,
        }
    }

    fn short(tag: u16, v: u16) -> Self {
        Self {
            tag,
            typ: TYPE_SHORT,
            count: 1,
            data: v.to_le_bytes().to_vec(),
        }
    }

    fn long(tag: u16, v: u32) -> Self {
        Self {
            tag,
            typ: TYPE_LONG,
            count: 1,
            data: v.to_le_bytes().to_vec(),
        }
    }

    fn rational(tag: u16, (num, den): (u32, u32)) -> Self {
        let mut data = num.to_le_bytes().to_vec();
        data.extend_from_slice(&den.to_le_bytes());
        Self {
            tag,
            typ: TYPE_RATIONAL,
            count: 1,
            data,
        }
    }
}

/// Serialize one IFD starting at `offset`. Returns the IFD bytes followed by
/// its out-of-line data.
fn write_ifd(entries: &[Entry], offset: u32) -> Vec<u8> {
    let table_len = 2 + entries.len() as u32 * 12 + 4;
    let mut data_offset = offset + table_len;
    let mut table = Vec::new();
    let mut extra = Vec::new();

    table.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for e in entries {
        table.extend_from_slice(&e.tag.to_le_bytes());
        table.extend_from_slice(&e.typ.to_le_bytes());
        table.extend_from_slice(&e.count.to_le_bytes());
        if e.data.len() <= 4 {
            let mut inline = e.data.clone();
            inline.resize(4, 0);
            table.extend_from_slice(&inline);
        } else {
            table.extend_from_slice(&data_offset.to_le_bytes());
            extra.extend_from_slice(&e.data);
            if e.data.len() % 2 == 1 {
                extra.push(0);
            }
            data_offset = offset + table_len + extra.len() as u32;
        }
    }
    table.extend_from_slice(&0u32.to_le_bytes());
    table.extend_from_slice(&extra);
    table
}

/// Little-endian TIFF with IFD0 and, when needed, an Exif sub-IFD.
pub fn tiff_block(exif: &TestExif) -> Vec<u8> {
    let mut ifd0 = Vec::new();
    if let Some(make) = exif.make {
        ifd0.push(Entry::ascii(TAG_MAKE, make));
    }
    if let Some(o) = exif.orientation {
        ifd0.push(Entry::short(TAG_ORIENTATION, o));
    }
    if let Some(dt) = exif.date_time {
        ifd0.push(Entry::ascii(TAG_DATE_TIME, dt));
    }

    let mut sub_ifd = Vec::new();
    if let Some(f) = exif.f_number {
        sub_ifd.push(Entry::rational(TAG_F_NUMBER, f));
    }
    if let Some(dto) = exif.date_time_original {
        sub_ifd.push(Entry::ascii(TAG_DATE_TIME_ORIGINAL, dto));
    }

    let mut out = b"II".to_vec();
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&8u32.to_le_bytes());

    if sub_ifd.is_empty() {
        out.extend_from_slice(&write_ifd(&ifd0, 8));
    } else {
        // Pointer value is patched once IFD0's size is known
        ifd0.push(Entry::long(TAG_EXIF_IFD, 0));
        let sized = write_ifd(&ifd0, 8);
        let sub_offset = 8 + sized.len() as u32;
        if let Some(ptr) = ifd0.last_mut() {
            ptr.data = sub_offset.to_le_bytes().to_vec();
        }
        out.extend_from_slice(&write_ifd(&ifd0, 8));
        out.extend_from_slice(&write_ifd(&sub_ifd, sub_offset));
    }
    out
}
