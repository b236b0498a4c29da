//! Album discovery from Hugo content pages.
//!
//! Each page in the album content directory (`content/album/` by default)
//! describes one album. The page's file stem is the slug, and its front
//! matter names the directory holding the originals:
//!
//! ```text
//! content/album/iceland.md
//! +++
//! title = "Iceland 2020"
//! album = "/home/me/photos/2020-iceland"
//! +++
//! ```
//!
//! All three Hugo front matter formats are read: TOML (`+++`), YAML (`---`)
//! and JSON (a leading `{ ... }` object). For YAML only a top-level
//! `album:` scalar is recognised, which is all the pipeline needs.
//!
//! Relative `album` paths resolve against the site root. Pages without an
//! `album` key (or whose front matter can't be parsed) are logged and
//! skipped; they are ordinary pages as far as this tool is concerned.

use crate::types::AlbumSource;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("content dir {0} not found")]
    NotFound(PathBuf),
    #[error("cannot read content dir {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("no front matter")]
    Missing,
    #[error("front matter not terminated")]
    Unterminated,
    #[error("TOML front matter: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON front matter: {0}")]
    Json(#[from] serde_json::Error),
}

const FRONT_MATTER_KEY: &str = "album";

/// Find every album page in `content_dir`, sorted by file name.
pub fn find_albums(content_dir: &Path, site_root: &Path) -> Result<Vec<AlbumSource>, DiscoverError> {
    if !content_dir.is_dir() {
        return Err(DiscoverError::NotFound(content_dir.to_path_buf()));
    }

    let mut albums = Vec::new();
    for entry in WalkDir::new(content_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| DiscoverError::Unreadable {
            path: content_dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        let Some(slug) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };

        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("skipping {}: {e}", path.display());
                continue;
            }
        };
        match album_dir_from_front_matter(&text) {
            Ok(Some(dir)) => {
                tracing::debug!("album {slug} -> {dir}");
                albums.push(AlbumSource {
                    slug,
                    source_dir: site_root.join(dir),
                });
            }
            Ok(None) => tracing::info!("no album setting in {}", path.display()),
            Err(e) => tracing::warn!("skipping {}: {e}", path.display()),
        }
    }
    Ok(albums)
}

/// The `album` value of a page's front matter, if present.
pub fn album_dir_from_front_matter(text: &str) -> Result<Option<String>, FrontMatterError> {
    let text = text.trim_start_matches('\u{feff}').trim_start();
    if text.starts_with('{') {
        return json_album(text);
    }
    if let Some(body) = delimited(text, "+++")? {
        let table: toml::Table = toml::from_str(body)?;
        return Ok(table
            .get(FRONT_MATTER_KEY)
            .and_then(|v| v.as_str())
            .map(str::to_string));
    }
    if let Some(body) = delimited(text, "---")? {
        return Ok(yaml_album(body));
    }
    Err(FrontMatterError::Missing)
}

/// Content between an opening `delim` line and the next `delim` line.
fn delimited<'a>(text: &'a str, delim: &str) -> Result<Option<&'a str>, FrontMatterError> {
    let Some(first_line_end) = text.find('\n') else {
        return Ok(None);
    };
    if text[..first_line_end].trim_end() != delim {
        return Ok(None);
    }
    let rest = &text[first_line_end + 1..];
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == delim {
            return Ok(Some(&rest[..offset]));
        }
        offset += line.len();
    }
    Err(FrontMatterError::Unterminated)
}

fn json_album(text: &str) -> Result<Option<String>, FrontMatterError> {
    let mut stream = serde_json::Deserializer::from_str(text).into_iter::<serde_json::Value>();
    let value = match stream.next() {
        Some(v) => v?,
        None => return Err(FrontMatterError::Missing),
    };
    Ok(value
        .get(FRONT_MATTER_KEY)
        .and_then(|v| v.as_str())
        .map(str::to_string))
}

fn yaml_album(body: &str) -> Option<String> {
    body.lines().find_map(|line| {
        // Indented lines belong to nested mappings
        let value = line.strip_prefix(FRONT_MATTER_KEY)?.strip_prefix(':')?;
        let value = value.split(" #").next().unwrap_or("").trim();
        let unquoted = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .unwrap_or(value);
        (!unquoted.is_empty()).then(|| unquoted.to_string())
    })
}
