//! Concurrent rendition pipeline.
//!
//! Turns album source directories into [`AlbumManifest`]s, producing the
//! JPEG renditions on the way.
//!
//! ## Per-file task
//!
//! ```text
//! read bytes → EXIF metadata → source hash → for each planned label:
//!     cache check → (hit) identify existing file
//!                 → (miss) decode → resize → rotate → encode
//! ```
//!
//! The task always yields an [`ImageRecord`]. A rendition that fails is
//! listed in [`ImageRecord::failed`] and the task moves on to the next label.
//! An unreadable source, or a panic anywhere inside the task, marks every
//! planned label failed. Nothing that happens to one file aborts its album.
//!
//! ## Scheduling
//!
//! Two nested fan-outs run on the global rayon pool: one task per album in
//! [`process_albums`], one task per source file in [`process_album`]. Each
//! fan-out is joined by counting: every task sends exactly one result tagged
//! with its dispatch index, and the channel is drained once the scope has
//! returned. The pool size is the only cap on concurrency
//! (`[processing] max_processes`).
//!
//! Tasks share read-only configuration plus the album's
//! [`RenditionCache`]. Each task writes only its own `<stem>_<label>.jpg`
//! files, so there are no write-write races on outputs.
//!
//! ## Output structure
//!
//! ```text
//! static/album/
//! └── iceland/
//!     ├── .cache-manifest.json
//!     ├── cover_small.jpg
//!     ├── cover_medium.jpg
//!     ├── cover_large.jpg
//!     ├── DSC_0001_small.jpg
//!     └── DSC_0001_large.jpg
//! ```

use crate::cache::{CacheStats, RenditionCache, hash_source};
use crate::config::{PipelineConfig, RenditionsConfig};
use crate::imaging::{ImageBackend, SourceInput, produce_rendition, relative_url};
use crate::metadata::extract_metadata;
use crate::naming::{rendition_file_name, source_stem};
use crate::plan::{DerivationPlan, plan_renditions};
use crate::scan::{ScanError, scan_album_dir};
use crate::types::{AlbumManifest, AlbumSource, CaptureMetadata, ImageRecord, Label, RenditionResult};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("cannot create output dir {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("album task for {0} panicked")]
    Panicked(String),
}

/// Why every rendition of a file failed.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("cannot read source: {0}")]
    SourceRead(#[from] std::io::Error),
    #[error("processing panicked")]
    Panicked,
    #[error("output names collide with {}", .0.display())]
    NameCollision(PathBuf),
}

/// Configuration for processing, resolved from [`PipelineConfig`].
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub renditions: RenditionsConfig,
    /// Album output directories are created under this root.
    pub static_root: PathBuf,
    pub url_prefix: String,
    pub use_cache: bool,
}

impl ProcessConfig {
    /// Build from a config whose paths are already resolved against the site root.
    pub fn from_pipeline_config(config: &PipelineConfig, use_cache: bool) -> Self {
        Self {
            renditions: config.renditions.clone(),
            static_root: config.paths.static_root.clone(),
            url_prefix: config.paths.url_prefix.clone(),
            use_cache,
        }
    }

    pub fn album_output_dir(&self, slug: &str) -> PathBuf {
        self.static_root.join(slug)
    }
}

/// What happened to one rendition during this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantStatus {
    Cached,
    Encoded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantInfo {
    pub label: Label,
    pub status: VariantStatus,
}

/// Progress events. `ImageProcessed` is sent by each file task as it
/// completes, so images of one album (and of concurrent albums) arrive in
/// completion order, between that album's `AlbumStarted` and `AlbumFinished`.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    AlbumStarted {
        slug: String,
        image_count: usize,
    },
    ImageProcessed {
        slug: String,
        source_path: String,
        variants: Vec<VariantInfo>,
    },
    AlbumFinished {
        slug: String,
        stats: CacheStats,
    },
    AlbumFailed {
        slug: String,
        error: String,
    },
}

/// Result of processing one album.
#[derive(Debug)]
pub struct AlbumRun {
    pub manifest: AlbumManifest,
    pub stats: CacheStats,
}

struct FileOutcome {
    record: ImageRecord,
    variants: Vec<VariantInfo>,
    stats: CacheStats,
}

fn send(events: &Option<Sender<ProcessEvent>>, event: ProcessEvent) {
    if let Some(tx) = events {
        // Receiver gone means nobody is printing; processing carries on
        let _ = tx.send(event);
    }
}

/// Process every album concurrently. Results come back in input order, one
/// per album; a failed album does not affect the others.
pub fn process_albums(
    backend: &impl ImageBackend,
    albums: &[AlbumSource],
    config: &ProcessConfig,
    events: Option<Sender<ProcessEvent>>,
) -> Vec<Result<AlbumRun, ProcessError>> {
    let (tx, rx) = mpsc::channel();

    rayon::scope(|s| {
        for (index, album) in albums.iter().enumerate() {
            let tx = tx.clone();
            let events = events.clone();
            s.spawn(move |_| {
                let result = catch_unwind(AssertUnwindSafe(|| {
                    process_album(backend, album, config, events.clone())
                }))
                .unwrap_or_else(|_| Err(ProcessError::Panicked(album.slug.clone())));

                if let Err(e) = &result {
                    tracing::error!("album {}: {e}", album.slug);
                    send(
                        &events,
                        ProcessEvent::AlbumFailed {
                            slug: album.slug.clone(),
                            error: e.to_string(),
                        },
                    );
                }
                let _ = tx.send((index, result));
            });
        }
    });
    drop(tx);

    in_dispatch_order(rx.into_iter().collect())
}

/// Process one album: scan, fan out one task per source file, join, sort.
pub fn process_album(
    backend: &impl ImageBackend,
    album: &AlbumSource,
    config: &ProcessConfig,
    events: Option<Sender<ProcessEvent>>,
) -> Result<AlbumRun, ProcessError> {
    let sources = scan_album_dir(&album.source_dir)?;
    let output_dir = config.album_output_dir(&album.slug);
    std::fs::create_dir_all(&output_dir).map_err(|source| ProcessError::OutputDir {
        path: output_dir.clone(),
        source,
    })?;

    tracing::info!(
        "album {}: {} photos from {}",
        album.slug,
        sources.len(),
        album.source_dir.display()
    );
    send(
        &events,
        ProcessEvent::AlbumStarted {
            slug: album.slug.clone(),
            image_count: sources.len(),
        },
    );

    let cache = RenditionCache::open(&output_dir, config.use_cache);
    let collisions = stem_collisions(&sources);
    let (tx, rx) = mpsc::channel();

    rayon::scope(|s| {
        for (index, source) in sources.iter().enumerate() {
            let tx = tx.clone();
            let cache = &cache;
            let output_dir = output_dir.as_path();
            let collides_with = collisions.get(&index);
            let events = events.clone();
            let slug = album.slug.as_str();
            s.spawn(move |_| {
                let plan = plan_renditions(source, &config.renditions);
                let outcome = match collides_with {
                    Some(first) => {
                        let reason = TaskError::NameCollision(first.clone());
                        tracing::error!("{}: {reason}", source.display());
                        failed_outcome(source, &plan, &reason)
                    }
                    None => catch_unwind(AssertUnwindSafe(|| {
                        process_file(backend, cache, source, &plan, config, output_dir)
                    }))
                    .unwrap_or_else(|_| {
                        tracing::error!("task for {} panicked", source.display());
                        failed_outcome(source, &plan, &TaskError::Panicked)
                    }),
                };
                send(
                    &events,
                    ProcessEvent::ImageProcessed {
                        slug: slug.to_string(),
                        source_path: source.display().to_string(),
                        variants: outcome.variants.clone(),
                    },
                );
                let _ = tx.send((index, outcome));
            });
        }
    });
    drop(tx);

    let mut stats = CacheStats::default();
    let mut images = Vec::with_capacity(sources.len());
    for outcome in in_dispatch_order(rx.into_iter().collect()) {
        stats.merge(&outcome.stats);
        images.push(outcome.record);
    }
    sort_records(&mut images);

    if let Err(e) = cache.save() {
        tracing::warn!("album {}: cache manifest not saved: {e}", album.slug);
    }
    send(
        &events,
        ProcessEvent::AlbumFinished {
            slug: album.slug.clone(),
            stats,
        },
    );

    Ok(AlbumRun {
        manifest: AlbumManifest {
            source_dir: album.source_dir.clone(),
            slug: album.slug.clone(),
            images,
        },
        stats,
    })
}

/// Sources whose rendition names repeat an earlier source's (`a.jpg` and
/// `a.JPG` both write `a_small.jpg`), keyed by index, with the earlier path.
fn stem_collisions(sources: &[PathBuf]) -> HashMap<usize, PathBuf> {
    let mut first_by_stem: HashMap<String, &PathBuf> = HashMap::new();
    let mut collisions = HashMap::new();
    for (index, source) in sources.iter().enumerate() {
        match first_by_stem.entry(source_stem(source)) {
            Entry::Occupied(first) => {
                collisions.insert(index, (*first.get()).clone());
            }
            Entry::Vacant(slot) => {
                slot.insert(source);
            }
        }
    }
    collisions
}

fn in_dispatch_order<T>(mut tagged: Vec<(usize, T)>) -> Vec<T> {
    tagged.sort_by_key(|(index, _)| *index);
    tagged.into_iter().map(|(_, item)| item).collect()
}

/// Order records by capture time, undated last. Stable, so equal or absent
/// timestamps keep their listing order.
pub fn sort_records(records: &mut [ImageRecord]) {
    records.sort_by_key(|r| (r.metadata.date_time.is_none(), r.metadata.date_time));
}

fn process_file(
    backend: &impl ImageBackend,
    cache: &RenditionCache,
    source: &Path,
    plan: &DerivationPlan,
    config: &ProcessConfig,
    output_dir: &Path,
) -> FileOutcome {
    let bytes = match std::fs::read(source) {
        Ok(b) => b,
        Err(e) => {
            let e = TaskError::from(e);
            tracing::warn!("{}: {e}", source.display());
            return failed_outcome(source, plan, &e);
        }
    };

    let metadata = extract_metadata(&bytes);
    let hash = hash_source(&bytes);
    let input = SourceInput {
        bytes: &bytes,
        hash: &hash,
        rotation: metadata.rotation,
    };

    let mut record = ImageRecord {
        source_path: source.to_path_buf(),
        metadata: CaptureMetadata::default(),
        renditions: BTreeMap::new(),
        failed: BTreeMap::new(),
    };
    let mut variants = Vec::with_capacity(plan.specs.len());
    let mut stats = CacheStats::default();

    for spec in &plan.specs {
        let output = output_dir.join(rendition_file_name(source, spec.label));
        let status = match produce_rendition(backend, cache, &input, spec, &output) {
            Ok(produced) => {
                record.renditions.insert(
                    spec.label,
                    RenditionResult {
                        relative_url: relative_url(
                            &config.static_root,
                            &config.url_prefix,
                            &produced.output,
                        ),
                        width: produced.dimensions.width,
                        height: produced.dimensions.height,
                    },
                );
                if produced.encoded {
                    stats.encode();
                    VariantStatus::Encoded
                } else {
                    stats.hit();
                    VariantStatus::Cached
                }
            }
            Err(e) => {
                tracing::warn!("{} ({}): {e}", source.display(), spec.label);
                record.failed.insert(spec.label, e.to_string());
                stats.fail();
                VariantStatus::Failed
            }
        };
        variants.push(VariantInfo {
            label: spec.label,
            status,
        });
    }

    tracing::debug!("{} done", source.display());
    record.metadata = metadata;
    FileOutcome {
        record,
        variants,
        stats,
    }
}

/// An outcome where every planned label failed with `reason`.
fn failed_outcome(source: &Path, plan: &DerivationPlan, reason: &TaskError) -> FileOutcome {
    let labels = plan.labels();
    FileOutcome {
        record: ImageRecord {
            source_path: source.to_path_buf(),
            metadata: CaptureMetadata::default(),
            renditions: BTreeMap::new(),
            failed: labels.iter().map(|&l| (l, reason.to_string())).collect(),
        },
        variants: labels
            .iter()
            .map(|&label| VariantInfo {
                label,
                status: VariantStatus::Failed,
            })
            .collect(),
        stats: CacheStats {
            failed: labels.len() as u32,
            ..CacheStats::default()
        },
    }
}
