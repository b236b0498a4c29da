//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the pipeline needs:
//! `identify` (read an existing rendition's dimensions without decoding its
//! pixels) and `render` (decode, resize, rotate and encode one rendition).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests swap in the
//! `MockBackend` below, which records calls and writes placeholder files.

use super::params::RenderParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    DecodeFailed(String),
    #[error("Encode failed: {0}")]
    EncodeFailed(String),
}

/// Result of an identify or render operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Trait for image processing backends.
///
/// Implementations must be `Sync`: a single backend is shared by every file
/// task of every album.
pub trait ImageBackend: Sync {
    /// Read the pixel dimensions of an encoded image on disk.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Produce one rendition from the source's encoded bytes and write it to
    /// `params.output`. Returns the dimensions of the written image.
    ///
    /// The write must be atomic: on error, `params.output` is left untouched.
    fn render(&self, source: &[u8], params: &RenderParams) -> Result<Dimensions, BackendError>;
}
