//! Rendition cache for incremental builds.
//!
//! Decoding a full-size camera JPEG and resampling it with Lanczos3 dominates
//! the run time of an album. This module lets a file task skip that work when
//! a rendition already on disk is known to match what would be produced.
//!
//! # Fingerprints
//!
//! Each rendition is fingerprinted by two hashes:
//!
//! - **`source_hash`**: SHA-256 of the source file contents. Content-based
//!   rather than mtime-based so it survives copies and `git checkout`.
//!   Computed once per source file and shared by all of its renditions.
//! - **`params_hash`**: SHA-256 of (target width, quality, rotation angle).
//!   Changing the size table in `renditions.toml` changes this hash and
//!   forces the affected renditions to be re-encoded.
//!
//! # Decisions
//!
//! | Output file | Manifest entry | Decision |
//! |---|---|---|
//! | missing | any | [`CacheDecision::Miss`]: encode |
//! | present | same fingerprint | [`CacheDecision::Hit`]: read dimensions |
//! | present | none | [`CacheDecision::Adopt`]: trust the file, record the fingerprint |
//! | present | different fingerprint | [`CacheDecision::Stale`]: re-encode |
//!
//! `Adopt` covers renditions produced before this cache existed (or copied
//! in by hand): an untracked file is authoritative and its actual dimensions
//! are reported.
//!
//! # Storage
//!
//! One JSON manifest per album at `<album output dir>/.cache-manifest.json`,
//! keyed by rendition file name. File tasks of the same album share it
//! through a mutex that is only held for lookups and inserts, never across
//! an encode.
//!
//! # Bypassing the cache
//!
//! `--no-cache` opens the cache disabled: every planned rendition is
//! re-encoded, and the manifest is rewritten from scratch.

use crate::types::Rotation;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Name of the cache manifest file within an album output directory.
const MANIFEST_FILENAME: &str = ".cache-manifest.json";

/// Version of the cache manifest format. Bump this to invalidate all
/// existing caches when the format or key computation changes.
const MANIFEST_VERSION: u32 = 1;

/// Fingerprint of one rendition.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
}

/// On-disk cache manifest mapping rendition file names to fingerprints.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
}

impl CacheManifest {
    /// Create an empty manifest (used for `--no-cache` or first build).
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
        }
    }

    /// Load from an album output directory. Returns an empty manifest if the
    /// file doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(output_dir: &Path) -> Self {
        let content = match std::fs::read_to_string(manifest_path(output_dir)) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(m) if m.version == MANIFEST_VERSION => m,
            _ => Self::empty(),
        }
    }

    /// Save to an album output directory.
    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(output_dir), json)
    }

    pub fn get(&self, file_name: &str) -> Option<&CacheEntry> {
        self.entries.get(file_name)
    }

    pub fn insert(&mut self, file_name: String, entry: CacheEntry) {
        self.entries.insert(file_name, entry);
    }
}

/// What to do about one planned rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    Hit,
    Adopt,
    Stale,
    Miss,
}

impl CacheDecision {
    pub fn needs_encode(self) -> bool {
        matches!(self, CacheDecision::Stale | CacheDecision::Miss)
    }
}

/// Apply the decision table from the [module docs](self).
pub fn decide(output_exists: bool, recorded: Option<&CacheEntry>, wanted: &CacheEntry) -> CacheDecision {
    match (output_exists, recorded) {
        (false, _) => CacheDecision::Miss,
        (true, None) => CacheDecision::Adopt,
        (true, Some(entry)) if entry == wanted => CacheDecision::Hit,
        (true, Some(_)) => CacheDecision::Stale,
    }
}

/// The cache of one album, shared by its file tasks.
pub struct RenditionCache {
    output_dir: PathBuf,
    enabled: bool,
    manifest: Mutex<CacheManifest>,
}

impl RenditionCache {
    /// Open the cache for `output_dir`. A disabled cache starts empty and
    /// answers [`CacheDecision::Miss`] for everything.
    pub fn open(output_dir: &Path, enabled: bool) -> Self {
        let manifest = if enabled {
            CacheManifest::load(output_dir)
        } else {
            CacheManifest::empty()
        };
        Self {
            output_dir: output_dir.to_path_buf(),
            enabled,
            manifest: Mutex::new(manifest),
        }
    }

    /// Decide whether the rendition at `output` must be encoded.
    pub fn check(&self, output: &Path, wanted: &CacheEntry) -> CacheDecision {
        if !self.enabled {
            return CacheDecision::Miss;
        }
        let key = entry_key(output);
        let manifest = self.lock();
        decide(output.exists(), manifest.get(&key), wanted)
    }

    /// Record that `output` now matches `entry`.
    pub fn record(&self, output: &Path, entry: CacheEntry) {
        self.lock().insert(entry_key(output), entry);
    }

    pub fn save(&self) -> io::Result<()> {
        self.lock().save(&self.output_dir)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheManifest> {
        // A task that panicked mid-insert leaves a usable map behind
        self.manifest.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn entry_key(output: &Path) -> String {
    output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// SHA-256 hash of source bytes, returned as a hex string.
pub fn hash_source(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// SHA-256 hash of the parameters that shape one rendition.
pub fn hash_rendition_params(width: u32, quality: u32, rotation: Rotation) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"rendition\0");
    hasher.update(width.to_le_bytes());
    hasher.update(quality.to_le_bytes());
    hasher.update(rotation.degrees().to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Summary of cache behaviour for one album or a whole run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub encoded: u32,
    pub failed: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn encode(&mut self) {
        self.encoded += 1;
    }

    pub fn fail(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.encoded + self.failed
    }

    pub fn merge(&mut self, other: &CacheStats) {
        self.hits += other.hits;
        self.encoded += other.encoded;
        self.failed += other.failed;
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} encoded ({} total)",
                self.hits,
                self.encoded,
                self.total()
            )?;
        } else {
            write!(f, "{} encoded", self.encoded)?;
        }
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        Ok(())
    }
}

/// Resolve the cache manifest path for an album output directory.
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILENAME)
}
