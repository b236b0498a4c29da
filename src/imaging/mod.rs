//! Image processing in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Decode** | `image::load_from_memory_with_format` (JPEG) |
//! | **Resize** | `resize_exact` with Lanczos3 |
//! | **Rotate** | `rotate90` / `rotate180` / `rotate270` |
//! | **Encode** | `JpegEncoder::new_with_quality`, written atomically |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining cache, calculations and backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::scaled_height;
pub use operations::{ProducedRendition, SourceInput, produce_rendition, relative_url};
pub use params::{Quality, RenderParams};
pub use rust_backend::RustBackend;
