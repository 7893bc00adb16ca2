// File utilities for the Caption Summary API
//
// This module contains utility functions for the temporary caption files written by the
// download tool: unique naming, lookup after a download, and best-effort cleanup.

use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Generate a unique file stem for one fetch
///
/// # Arguments
///
/// * `prefix` - Shared prefix of all temporary caption files
///
/// # Returns
///
/// * `String` of the form `<prefix>_<uuid>`
pub fn generate_unique_stem(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4())
}

/// List regular files in `dir` whose name starts with `stem`
fn files_with_stem(dir: &Path, stem: &str) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(stem))
        .map(|entry| entry.path())
        .collect();
    files.sort();
    Ok(files)
}

/// Find the caption files written for `stem` with the given extension, sorted by name
///
/// # Errors
///
/// Returns an IO error if the directory cannot be read
pub fn find_caption_files(dir: &Path, stem: &str, extension: &str) -> io::Result<Vec<PathBuf>> {
    Ok(files_with_stem(dir, stem)?
        .into_iter()
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(extension))
        .collect())
}

/// Remove every file in `dir` whose name starts with `prefix`
///
/// This function logs errors but doesn't return them to the caller.
/// Returns the number of files removed.
pub fn purge_prefix(dir: &Path, prefix: &str) -> usize {
    let files = match files_with_stem(dir, prefix) {
        Ok(files) => files,
        Err(e) => {
            warn!("Failed to list {} for cleanup: {}", dir.display(), e);
            return 0;
        }
    };

    files.iter().filter(|path| remove_file(path)).count()
}

/// Remove a single file, logging instead of failing
pub fn remove_file(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed temporary file: {}", path.display());
            true
        }
        Err(e) => {
            warn!("Failed to remove temporary file {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_stems_differ() {
        let a = generate_unique_stem("temp_transcript");
        let b = generate_unique_stem("temp_transcript");
        assert!(a.starts_with("temp_transcript_"));
        assert_ne!(a, b);
    }

    #[test]
    fn finds_only_matching_extension_and_stem() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("job_1.en.vtt"), "WEBVTT").unwrap();
        fs::write(dir.path().join("job_1.en.srt"), "1").unwrap();
        fs::write(dir.path().join("job_2.en.vtt"), "WEBVTT").unwrap();

        let found = find_caption_files(dir.path(), "job_1", "vtt").unwrap();
        assert_eq!(found, vec![dir.path().join("job_1.en.vtt")]);
    }

    #[test]
    fn purge_removes_every_file_with_stem() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("job_1.en.vtt"), "").unwrap();
        fs::write(dir.path().join("job_1.part"), "").unwrap();
        fs::write(dir.path().join("other.vtt"), "").unwrap();

        assert_eq!(purge_prefix(dir.path(), "job_1"), 2);
        assert!(!dir.path().join("job_1.en.vtt").exists());
        assert!(dir.path().join("other.vtt").exists());
    }

    #[test]
    fn purge_of_missing_directory_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(purge_prefix(&dir.path().join("gone"), "job"), 0);
    }
}
