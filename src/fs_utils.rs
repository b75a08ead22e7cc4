use crate::error::{Result, VhostError};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Reads the full text of a configuration file
///
/// # Errors
///
/// - `VhostError::ConfigNotFound` if the path doesn't exist or isn't a file.
/// - `VhostError::ConfigUnreadable` if the file exists but permission is denied.
/// - `VhostError::Io` for any other read failure (including invalid UTF-8).
pub fn read_config_file(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(VhostError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    tracing::trace!(path = %path.display(), "reading configuration file");
    fs::read_to_string(path).map_err(|e| VhostError::from_read(path.to_path_buf(), e))
}

/// Lists every regular file below `dir`, descending into nested directories
///
/// Symlinks pointing at files are listed, symlinked directories are not descended.
/// A missing directory yields an empty list. With `sorted` set, entries of each
/// directory are visited in file name order; otherwise the filesystem order is kept.
///
/// # Errors
///
/// Returns `VhostError::WalkDir` if an entry cannot be read during traversal.
pub fn list_config_files(dir: &Path, sorted: bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut walker = WalkDir::new(dir).min_depth(1).follow_links(false);
    if sorted {
        walker = walker.sort_by_file_name();
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        let file_type = entry.file_type();
        if file_type.is_file() || (file_type.is_symlink() && entry.path().is_file()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Returns the directory an include target is resolved against
pub fn including_dir(path: &Path) -> PathBuf {
    path.parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
