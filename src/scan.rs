//! Album directory scanning.
//!
//! Lists the candidate source photos of one album directory. The scan is flat
//! (subdirectories are never entered) and applies three rules per entry:
//!
//! - directories are skipped,
//! - names not ending in `.jpg` (any case) are skipped,
//! - our own outputs (`*_small.jpg`, `*_medium.jpg`, `*_large.jpg`) are skipped.
//!
//! An entry that cannot be inspected (a dangling symlink, say) does not fail
//! the album. If its name looks like a candidate it is returned anyway, and
//! reading it later fails that one photo; otherwise it is logged and skipped.
//! Only a directory that is missing or cannot be listed is a [`ScanError`].
//!
//! Candidates come back sorted by file name. Nothing downstream depends on
//! this order for correctness (the manifest is sorted by capture time), but it
//! keeps runs reproducible and gives undated photos a stable position.

use crate::naming;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("source dir {0} not found")]
    NotFound(PathBuf),
    #[error("cannot read source dir {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Return the candidate source files of `dir`.
pub fn scan_album_dir(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::NotFound(dir.to_path_buf()));
    }

    let mut candidates = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => match entry_error_path(dir, &err).map(Path::to_path_buf) {
                Some(path) => {
                    tracing::warn!("cannot inspect {}: {err}", path.display());
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    if is_candidate(&name, false) {
                        candidates.push(path);
                    }
                    continue;
                }
                None => {
                    return Err(ScanError::Unreadable {
                        path: dir.to_path_buf(),
                        source: err,
                    });
                }
            },
        };
        let name = entry.file_name().to_string_lossy();
        if is_candidate(&name, entry.file_type().is_dir()) {
            candidates.push(entry.into_path());
        }
    }
    Ok(candidates)
}

/// The child of `dir` a walk error is about, or `None` when the error
/// concerns `dir` itself.
fn entry_error_path<'a>(dir: &Path, err: &'a walkdir::Error) -> Option<&'a Path> {
    if err.depth() == 0 {
        return None;
    }
    err.path().filter(|p| p.parent() == Some(dir))
}

/// The per-entry filter, separated from I/O for testing.
pub fn is_candidate(file_name: &str, is_dir: bool) -> bool {
    !is_dir && naming::has_jpeg_extension(file_name) && !naming::is_rendition_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn candidate_filter_rules() {
        assert!(is_candidate("a.jpg", false));
        assert!(is_candidate("B.JPG", false));
        assert!(!is_candidate("a.jpg", true));
        assert!(!is_candidate("a.png", false));
        assert!(!is_candidate("a_small.jpg", false));
        assert!(!is_candidate("a_medium.jpg", false));
        assert!(!is_candidate("a_large.jpg", false));
    }

    #[test]
    fn scan_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        for name in [
            "b.jpg",
            "A.JPG",
            "b_small.jpg",
            "b_large.jpg",
            "notes.txt",
            "raw.cr2",
            "cover.jpg",
        ] {
            fs::write(tmp.path().join(name), b"x").unwrap();
        }
        fs::create_dir(tmp.path().join("nested.jpg")).unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("sub/inner.jpg"), b"x").unwrap();

        let found = scan_album_dir(tmp.path()).unwrap();
        assert_eq!(names(&found), vec!["A.JPG", "b.jpg", "cover.jpg"]);
        assert!(found.iter().all(|p| p.starts_with(tmp.path())));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_kept_as_candidate() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.jpg"), b"x").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone.jpg"), tmp.path().join("b.jpg")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone.txt"), tmp.path().join("c.txt")).unwrap();

        let found = scan_album_dir(tmp.path()).unwrap();
        assert_eq!(names(&found), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn scan_empty_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(scan_album_dir(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn scan_missing_dir_is_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        let err = scan_album_dir(&missing).unwrap_err();
        assert!(matches!(err, ScanError::NotFound(p) if p == missing));
    }

    #[test]
    fn scan_file_instead_of_dir_is_error() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.jpg");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            scan_album_dir(&file),
            Err(ScanError::NotFound(_))
        ));
    }
}
