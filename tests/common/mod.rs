//! Fixtures for the end-to-end pipeline tests.

use image::codecs::jpeg::JpegEncoder;
use image::{ImageEncoder, Rgb, RgbImage};
use photo_renditions::config::{PipelineConfig, RenditionsConfig, SizeConfig};
use photo_renditions::process::ProcessConfig;
use photo_renditions::types::AlbumSource;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 3 % 256) as u8, 90])
    });
    let mut out = Vec::new();
    JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// A JPEG with an EXIF block holding an optional `Orientation` (IFD0) and
/// an optional `DateTimeOriginal` (Exif sub-IFD).
pub fn jpeg_with_exif(
    width: u32,
    height: u32,
    orientation: Option<u16>,
    date_time_original: Option<&str>,
) -> Vec<u8> {
    let tiff = tiff(orientation, date_time_original);
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);

    let jpeg = jpeg_bytes(width, height);
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

fn entry(out: &mut Vec<u8>, tag: u16, typ: u16, count: u32, value: [u8; 4]) {
    out.extend_from_slice(&tag.to_le_bytes());
    out.extend_from_slice(&typ.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&value);
}

fn tiff(orientation: Option<u16>, date_time_original: Option<&str>) -> Vec<u8> {
    let ifd0_count = orientation.is_some() as u16 + date_time_original.is_some() as u16;
    let ifd0_len = 2 + 12 * ifd0_count as u32 + 4;
    let sub_offset = 8 + ifd0_len;

    let mut out = b"II".to_vec();
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&8u32.to_le_bytes());

    out.extend_from_slice(&ifd0_count.to_le_bytes());
    if let Some(o) = orientation {
        let mut v = [0u8; 4];
        v[..2].copy_from_slice(&o.to_le_bytes());
        entry(&mut out, 0x0112, 3, 1, v);
    }
    if date_time_original.is_some() {
        entry(&mut out, 0x8769, 4, 1, sub_offset.to_le_bytes());
    }
    out.extend_from_slice(&0u32.to_le_bytes());

    if let Some(dto) = date_time_original {
        let mut text = dto.as_bytes().to_vec();
        text.push(0);
        let data_offset = sub_offset + 2 + 12 + 4;
        out.extend_from_slice(&1u16.to_le_bytes());
        entry(&mut out, 0x9003, 2, text.len() as u32, data_offset.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&text);
    }
    out
}

/// A throwaway site: originals under `photos/<slug>`, outputs under the
/// configured static root.
pub struct Site {
    pub root: TempDir,
}

impl Site {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn album(&self, slug: &str) -> AlbumSource {
        let source_dir = self.path().join("photos").join(slug);
        std::fs::create_dir_all(&source_dir).unwrap();
        AlbumSource {
            slug: slug.to_string(),
            source_dir,
        }
    }

    pub fn add(&self, album: &AlbumSource, name: &str, bytes: &[u8]) -> PathBuf {
        let path = album.source_dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    /// Stock configuration resolved against this site.
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.paths = config.paths.resolve(self.path());
        config
    }

    pub fn process_config(&self) -> ProcessConfig {
        ProcessConfig::from_pipeline_config(&self.pipeline_config(), true)
    }

    /// Narrow widths so encodes stay fast.
    pub fn small_process_config(&self) -> ProcessConfig {
        let mut config = self.pipeline_config();
        config.renditions = RenditionsConfig {
            small: SizeConfig {
                width: 40,
                quality: 80,
            },
            medium: SizeConfig {
                width: 60,
                quality: 80,
            },
            large: SizeConfig {
                width: 80,
                quality: 80,
            },
            ..RenditionsConfig::default()
        };
        ProcessConfig::from_pipeline_config(&config, true)
    }
}
