//! Utility functions and helpers for the matching pipeline

use std::path::{Path, PathBuf};

/// Validate that a path has an allowed extension
pub(crate) fn has_allowed_extension(path: &Path, allowed_extensions: &[String]) -> bool {
    if let Some(ext) = path.extension() {
        if let Some(ext_str) = ext.to_str() {
            return allowed_extensions
                .iter()
                .any(|e| e.eq_ignore_ascii_case(ext_str));
        }
    }
    false
}

/// List image files directly inside a folder, sorted by path.
///
/// Subdirectories are not descended into. A missing or unreadable folder
/// yields an empty list.
pub(crate) fn list_images(dir: &Path, allowed_extensions: &[String]) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("cannot read image folder {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_allowed_extension(path, allowed_extensions))
        .collect();
    files.sort();
    files
}
