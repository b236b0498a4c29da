//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`operations`](super::operations), which decides what to
//! render and whether the cache already has it, and the
//! [`backend`](super::backend), which does the pixel work.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1-100, default 80), clamped on construction.
//! - [`RenderParams`]: everything the backend needs to write one rendition.

use crate::types::Rotation;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Parameters for rendering one rendition from source bytes.
///
/// Only the width is given: the height follows from the source aspect ratio,
/// which the backend learns while decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub output: PathBuf,
    pub width: u32,
    pub quality: Quality,
    pub rotation: Rotation,
}
