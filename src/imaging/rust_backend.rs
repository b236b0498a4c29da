//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only) |
//! | Decode (JPEG) | `image::load_from_memory_with_format` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Rotate | `DynamicImage::rotate90` / `rotate180` / `rotate270` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! Renditions are written to a `.tmp` sibling and renamed into place, so a
//! crash mid-encode never leaves a truncated file that the cache would later
//! trust.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::scaled_height;
use super::params::RenderParams;
use crate::types::Rotation;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_jpeg(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .map_err(|e| BackendError::DecodeFailed(e.to_string()))
}

/// Turn the buffer upright. Every rotation goes through this one dispatch.
pub(crate) fn apply_rotation(img: DynamicImage, rotation: Rotation) -> DynamicImage {
    match rotation {
        Rotation::None => img,
        Rotation::Clockwise90 => img.rotate90(),
        Rotation::CounterClockwise90 => img.rotate270(),
        Rotation::Half => img.rotate180(),
    }
}

fn temp_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    output.with_file_name(name)
}

/// Encode as JPEG to a temp sibling, then rename over `output`.
fn save_jpeg(img: &DynamicImage, output: &Path, quality: u8) -> Result<(), BackendError> {
    let tmp = temp_path(output);
    let result = write_jpeg(img, &tmp, quality).and_then(|()| {
        std::fs::rename(&tmp, output)?;
        Ok(())
    });
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

fn write_jpeg(img: &DynamicImage, path: &Path, quality: u8) -> Result<(), BackendError> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, quality))
        .map_err(|e| BackendError::EncodeFailed(e.to_string()))?;
    writer.flush()?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::DecodeFailed(format!(
                "Failed to read dimensions of {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Dimensions { width, height })
    }

    fn render(&self, source: &[u8], params: &RenderParams) -> Result<Dimensions, BackendError> {
        let img = decode_jpeg(source)?;
        let height = scaled_height(img.width(), img.height(), params.width);
        let resized = img.resize_exact(params.width, height, FilterType::Lanczos3);
        let upright = apply_rotation(resized, params.rotation);

        save_jpeg(&upright, &params.output, params.quality.value() as u8)?;
        Ok(Dimensions {
            width: upright.width(),
            height: upright.height(),
        })
    }
}
