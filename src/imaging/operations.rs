//! High-level image operations.
//!
//! These functions combine the cache, calculations and backend execution:
//! given one planned rendition they decide whether the file on disk can be
//! reused, call the backend when it can't, and keep the cache manifest in
//! step.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::RenderParams;
use crate::cache::{CacheDecision, CacheEntry, RenditionCache, hash_rendition_params};
use crate::plan::RenditionSpec;
use crate::types::Rotation;
use std::path::{Component, Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// The source photo as seen by its file task: bytes loaded once, hashed once.
#[derive(Debug)]
pub struct SourceInput<'a> {
    pub bytes: &'a [u8],
    pub hash: &'a str,
    pub rotation: Rotation,
}

/// One rendition after [`produce_rendition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducedRendition {
    pub output: PathBuf,
    pub dimensions: Dimensions,
    /// False when an existing file was reused.
    pub encoded: bool,
}

/// Produce (or reuse) the rendition `spec` of `source` at `output`.
///
/// Reused files report their actual dimensions as read from disk. A reused
/// file that can no longer be read is re-encoded.
pub fn produce_rendition(
    backend: &impl ImageBackend,
    cache: &RenditionCache,
    source: &SourceInput<'_>,
    spec: &RenditionSpec,
    output: &Path,
) -> Result<ProducedRendition> {
    let fingerprint = CacheEntry {
        source_hash: source.hash.to_string(),
        params_hash: hash_rendition_params(spec.width, spec.quality.value(), source.rotation),
    };

    let decision = cache.check(output, &fingerprint);
    if !decision.needs_encode() {
        match backend.identify(output) {
            Ok(dimensions) => {
                if decision == CacheDecision::Adopt {
                    cache.record(output, fingerprint);
                }
                return Ok(ProducedRendition {
                    output: output.to_path_buf(),
                    dimensions,
                    encoded: false,
                });
            }
            Err(e) => {
                tracing::warn!("{} unreadable, re-encoding: {e}", output.display());
            }
        }
    }

    let dimensions = backend.render(
        source.bytes,
        &RenderParams {
            output: output.to_path_buf(),
            width: spec.width,
            quality: spec.quality,
            rotation: source.rotation,
        },
    )?;
    cache.record(output, fingerprint);

    Ok(ProducedRendition {
        output: output.to_path_buf(),
        dimensions,
        encoded: true,
    })
}

/// URL of `dest` relative to `static_root`, prefixed with `url_prefix`.
///
/// Always `/`-separated. A `dest` outside `static_root` keeps its full path.
pub fn relative_url(static_root: &Path, url_prefix: &str, dest: &Path) -> String {
    let rel = dest.strip_prefix(static_root).unwrap_or(dest);
    let parts = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>();

    let prefix = url_prefix.trim_matches('/');
    if prefix.is_empty() {
        parts.join("/")
    } else {
        format!("{}/{}", prefix, parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Quality;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::types::Label;
    use std::fs;
    use tempfile::TempDir;

    fn small() -> RenditionSpec {
        RenditionSpec {
            label: Label::Small,
            width: 600,
            quality: Quality::new(80),
        }
    }

    fn input(rotation: Rotation) -> SourceInput<'static> {
        SourceInput {
            bytes: b"source",
            hash: "abc",
            rotation,
        }
    }

    // =========================================================================
    // produce_rendition
    // =========================================================================

    #[test]
    fn missing_output_is_rendered_and_recorded() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("a_small.jpg");
        let cache = RenditionCache::open(tmp.path(), true);
        let backend = MockBackend::new();

        let produced =
            produce_rendition(&backend, &cache, &input(Rotation::Clockwise90), &small(), &output)
                .unwrap();

        assert!(produced.encoded);
        assert_eq!(produced.dimensions, Dimensions { width: 450, height: 600 });
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Render {
                output: output.to_string_lossy().to_string(),
                width: 600,
                quality: 80,
                rotation: Rotation::Clockwise90,
            }]
        );
        assert_eq!(
            cache.check(
                &output,
                &CacheEntry {
                    source_hash: "abc".into(),
                    params_hash: hash_rendition_params(600, 80, Rotation::Clockwise90),
                }
            ),
            CacheDecision::Hit
        );
    }

    #[test]
    fn untracked_existing_output_reports_its_own_dimensions() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("a_small.jpg");
        fs::write(&output, "old").unwrap();
        let cache = RenditionCache::open(tmp.path(), true);
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 123,
            height: 45,
        }]);

        let produced =
            produce_rendition(&backend, &cache, &input(Rotation::None), &small(), &output).unwrap();

        assert!(!produced.encoded);
        assert_eq!(produced.dimensions, Dimensions { width: 123, height: 45 });
        assert_eq!(backend.render_count(), 0);
    }

    #[test]
    fn changed_params_trigger_reencode() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("a_small.jpg");
        let cache = RenditionCache::open(tmp.path(), true);
        let backend = MockBackend::new();

        produce_rendition(&backend, &cache, &input(Rotation::None), &small(), &output).unwrap();
        let wider = RenditionSpec {
            width: 700,
            ..small()
        };
        let produced =
            produce_rendition(&backend, &cache, &input(Rotation::None), &wider, &output).unwrap();

        assert!(produced.encoded);
        assert_eq!(backend.render_count(), 2);
    }

    #[test]
    fn unreadable_cached_output_is_reencoded() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("a_small.jpg");
        fs::write(&output, "corrupt").unwrap();
        let cache = RenditionCache::open(tmp.path(), true);
        // No identify results: identify fails
        let backend = MockBackend::new();

        let produced =
            produce_rendition(&backend, &cache, &input(Rotation::None), &small(), &output).unwrap();
        assert!(produced.encoded);
    }

    #[test]
    fn render_failure_propagates() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("a_small.jpg");
        let cache = RenditionCache::open(tmp.path(), true);
        let backend = MockBackend::failing_on(&["a_small.jpg"]);

        let result = produce_rendition(&backend, &cache, &input(Rotation::None), &small(), &output);
        assert!(result.is_err());
    }

    // =========================================================================
    // relative_url
    // =========================================================================

    #[test]
    fn relative_url_prefixes_static_relative_path() {
        assert_eq!(
            relative_url(
                Path::new("/site/static/album"),
                "album",
                Path::new("/site/static/album/trip/a_small.jpg")
            ),
            "album/trip/a_small.jpg"
        );
    }

    #[test]
    fn relative_url_without_prefix() {
        assert_eq!(
            relative_url(Path::new("/out"), "", Path::new("/out/x/a_large.jpg")),
            "x/a_large.jpg"
        );
    }

    #[test]
    fn relative_url_trims_prefix_slashes() {
        assert_eq!(
            relative_url(Path::new("/out"), "/photos/", Path::new("/out/a.jpg")),
            "photos/a.jpg"
        );
    }
}
