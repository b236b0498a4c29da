//! # Photo Renditions
//!
//! Derives web-sized, upright JPEG renditions of the photos behind a Hugo
//! site's albums and writes an `album.toml` per album for the templates to
//! read.
//!
//! # Pipeline
//!
//! ```text
//! discover   content/album/*.md   →  (slug, source dir) pairs
//! scan       source dir           →  candidate *.jpg files
//! plan       file name            →  labels + widths (small, large; cover adds medium)
//! process    file                 →  EXIF metadata + renditions (cached or encoded)
//! sort       records              →  capture-time order, undated last
//! export     AlbumManifest        →  data/album/<slug>/album.toml
//! ```
//!
//! Albums are processed concurrently, and so are the files of each album.
//! Both fan-outs run on one rayon pool. A failure in one file becomes a
//! partial record; a failure in one album leaves the others untouched.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`discover`] | Finds album pages and reads `album` from their front matter |
//! | [`scan`] | Lists candidate source photos of one album directory |
//! | [`naming`] | Source and rendition file name conventions |
//! | [`plan`] | Chooses the renditions for each source file |
//! | [`metadata`] | EXIF capture time, orientation and tag map |
//! | [`imaging`] | Backend trait, decode/resize/rotate/encode, dimension math |
//! | [`cache`] | Fingerprint cache deciding which renditions to re-encode |
//! | [`process`] | The concurrent album/file scheduler and progress events |
//! | [`export`] | `album.toml` serialization |
//! | [`config`] | `renditions.toml` loading, merging and validation |
//! | [`types`] | Values shared across stages (`ImageRecord`, `AlbumManifest`, ...) |
//! | [`output`] | CLI output formatting |
//! | [`logging`] | `tracing` subscriber setup |
//!
//! # Design Decisions
//!
//! ## Stored Width Drives the Resize
//!
//! The target width applies to the pixel buffer as stored, before rotation.
//! A sideways portrait tagged `Orientation = 6` therefore comes out with the
//! target width as its *height*. Existing galleries depend on these
//! dimensions, so the rule is kept.
//!
//! ## Trust Existing Files, Verify Tracked Ones
//!
//! A rendition on disk that the cache has never seen is trusted as-is and
//! reported with its real dimensions. Once tracked, it is re-encoded whenever
//! the source bytes, width, quality or rotation change.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resampling, rotation and JPEG encoding all come from the
//! `image` crate. The binary has no runtime dependencies.

pub mod cache;
pub mod config;
pub mod discover;
pub mod export;
pub mod imaging;
pub mod logging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod plan;
pub mod process;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
