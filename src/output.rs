//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every album is shown by its slug, every photo by slug and file name, with the
//! source path as indented context. Progress output is driven by
//! [`ProcessEvent`]s, so lines appear as work completes.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! 001 iceland (3 photos)
//!     Source: /photos/2020-iceland
//!     cover.jpg → small, medium, large
//!     DSC_0001.jpg → small, large
//! 002 lost
//!     Source: /photos/lost
//!     Error: source dir /photos/lost not found
//! ```
//!
//! ## Build
//!
//! ```text
//! iceland (3 photos)
//!     iceland/cover.jpg
//!         small: cached
//!         medium: encoded
//!         large: failed
//! iceland: 1 cached, 1 encoded (3 total), 1 failed
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::config::RenditionsConfig;
use crate::plan::plan_renditions;
use crate::process::{ProcessEvent, VariantStatus};
use crate::scan::ScanError;
use crate::types::AlbumSource;
use std::path::{Path, PathBuf};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Album header with optional photo count.
///
/// ```text
/// 001 iceland (5 photos)
/// 002 lost
/// ```
fn entity_header(index: usize, slug: &str, count: Option<usize>) -> String {
    match count {
        Some(n) => format!("{} {} ({} photos)", format_index(index), slug, n),
        None => format!("{} {}", format_index(index), slug),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Check output
// ============================================================================

/// Format the `check` listing: each album's candidates and their planned labels.
pub fn format_check_output(
    albums: &[(AlbumSource, Result<Vec<PathBuf>, ScanError>)],
    rules: &RenditionsConfig,
) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, (album, scanned)) in albums.iter().enumerate() {
        let count = scanned.as_ref().ok().map(Vec::len);
        lines.push(entity_header(i + 1, &album.slug, count));
        lines.push(format!("{}Source: {}", indent(1), album.source_dir.display()));
        match scanned {
            Ok(files) => {
                for file in files {
                    let labels = plan_renditions(file, rules)
                        .labels()
                        .iter()
                        .map(|l| l.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    lines.push(format!(
                        "{}{} \u{2192} {}",
                        indent(1),
                        file_name(file),
                        labels
                    ));
                }
            }
            Err(e) => lines.push(format!("{}Error: {}", indent(1), e)),
        }
    }
    if albums.is_empty() {
        lines.push("No albums found".to_string());
    }
    lines
}

/// Print check output to stdout.
pub fn print_check_output(
    albums: &[(AlbumSource, Result<Vec<PathBuf>, ScanError>)],
    rules: &RenditionsConfig,
) {
    for line in format_check_output(albums, rules) {
        println!("{}", line);
    }
}

// ============================================================================
// Process output
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::AlbumStarted { slug, image_count } => {
            vec![format!("{} ({} photos)", slug, image_count)]
        }
        ProcessEvent::ImageProcessed {
            slug,
            source_path,
            variants,
        } => {
            let mut lines = vec![format!(
                "{}{}/{}",
                indent(1),
                slug,
                file_name(Path::new(source_path))
            )];
            for variant in variants {
                let status = match variant.status {
                    VariantStatus::Cached => "cached",
                    VariantStatus::Encoded => "encoded",
                    VariantStatus::Failed => "failed",
                };
                lines.push(format!("{}{}: {}", indent(2), variant.label, status));
            }
            lines
        }
        ProcessEvent::AlbumFinished { slug, stats } => vec![format!("{}: {}", slug, stats)],
        ProcessEvent::AlbumFailed { slug, error } => vec![format!("{}: FAILED: {}", slug, error)],
    }
}

/// Print a progress event to stdout.
pub fn print_process_event(event: &ProcessEvent) {
    for line in format_process_event(event) {
        println!("{}", line);
    }
}
