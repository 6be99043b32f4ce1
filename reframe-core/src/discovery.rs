//! File discovery module for finding video files to process.
//!
//! Scans only the top level of the input folder. A file qualifies when its
//! extension matches one of [`VIDEO_EXTENSIONS`](crate::config::VIDEO_EXTENSIONS)
//! (case-insensitive). Directories are never returned, even when their name
//! ends in a video extension.

use crate::config::VIDEO_EXTENSIONS;
use crate::error::ConfigError;

use log::debug;
use std::path::{Path, PathBuf};

/// Returns true when `path` has one of the recognized video extensions.
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Finds video files eligible for processing in the specified directory.
///
/// Files come back in directory-listing order unless `sort` is set, in which
/// case they are ordered by path.
///
/// # Errors
///
/// * [`ConfigError::InputFolderMissing`] if `input_dir` is not a directory
/// * [`ConfigError::ReadInputFolder`] if the listing cannot be read
/// * [`ConfigError::NoFilesFound`] if no file qualifies
///
/// # Examples
///
/// ```rust,no_run
/// use reframe_core::find_processable_files;
/// use std::path::Path;
///
/// let files = find_processable_files(Path::new("/path/to/videos"), true)?;
/// for file in files {
///     println!("  {}", file.display());
/// }
/// # Ok::<(), reframe_core::ConfigError>(())
/// ```
pub fn find_processable_files(input_dir: &Path, sort: bool) -> Result<Vec<PathBuf>, ConfigError> {
    if !input_dir.is_dir() {
        return Err(ConfigError::InputFolderMissing(input_dir.to_path_buf()));
    }

    let read_dir = std::fs::read_dir(input_dir).map_err(|source| ConfigError::ReadInputFolder {
        path: input_dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();

            if !path.is_file() {
                return None;
            }

            is_video_file(&path).then_some(path)
        })
        .collect();

    if sort {
        files.sort();
    }

    debug!(
        "Discovered {} video file(s) in {}",
        files.len(),
        input_dir.display()
    );

    if files.is_empty() {
        Err(ConfigError::NoFilesFound(input_dir.to_path_buf()))
    } else {
        Ok(files)
    }
}
