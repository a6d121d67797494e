use anyhow::{Result, Context};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use chrono::Local;
use log::debug;
use uuid::Uuid;

use crate::errors::DubbingError;

// @module: File and directory utilities

/// Video containers accepted as dubbing input
pub const SUPPORTED_VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    // @checks: Extension is one of the supported video containers
    pub fn is_supported_video<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| SUPPORTED_VIDEO_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Check a dubbing input before any processing starts
    pub fn validate_video_input<P: AsRef<Path>>(path: P, max_size_mb: u64) -> Result<(), DubbingError> {
        let path = path.as_ref();
        if !Self::file_exists(path) {
            return Err(DubbingError::InputNotFound(path.to_path_buf()));
        }

        if !Self::is_supported_video(path) {
            return Err(DubbingError::InvalidInput(format!(
                "Unsupported video format: {} (expected one of: {})",
                path.display(),
                SUPPORTED_VIDEO_EXTENSIONS.join(", ")
            )));
        }

        let size = fs::metadata(path)?.len();
        let limit = max_size_mb.saturating_mul(1024 * 1024);
        if size > limit {
            return Err(DubbingError::InvalidInput(format!(
                "Video is {:.1} MB, the limit is {} MB",
                size as f64 / (1024.0 * 1024.0),
                max_size_mb
            )));
        }

        Ok(())
    }

    /// Find every supported video under a directory, sorted by path
    pub fn find_videos<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && Self::is_supported_video(path) {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    // @generates: Unique scratch artifact path `<kind>_<timestamp>_<uuid8>.<ext>`
    pub fn scratch_path<P: AsRef<Path>>(scratch_dir: P, kind: &str, extension: &str) -> PathBuf {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let unique = Uuid::new_v4().simple().to_string();
        scratch_dir
            .as_ref()
            .join(format!("{}_{}_{}.{}", kind, timestamp, &unique[..8], extension))
    }

    // @generates: Final output path `dubbed[_subtitled]_<timestamp>.mp4`
    // An existing file with the same name gets a numeric suffix instead of being overwritten
    pub fn output_path<P: AsRef<Path>>(output_dir: P, subtitled: bool) -> PathBuf {
        let prefix = if subtitled { "dubbed_subtitled" } else { "dubbed" };
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let output_dir = output_dir.as_ref();

        let mut candidate = output_dir.join(format!("{}_{}.mp4", prefix, timestamp));
        let mut counter = 1;
        while candidate.exists() {
            candidate = output_dir.join(format!("{}_{}_{}.mp4", prefix, timestamp, counter));
            counter += 1;
        }
        candidate
    }

    /// File size in bytes, zero when the file is missing
    pub fn file_size<P: AsRef<Path>>(path: P) -> u64 {
        fs::metadata(path).map(|m| m.len()).unwrap_or(0)
    }

    /// Move a finished file into place. Falls back to copy and delete when the
    /// two paths are on different filesystems.
    pub fn move_file<P: AsRef<Path>, Q: AsRef<Path>>(from: P, to: Q) -> std::io::Result<()> {
        let (from, to) = (from.as_ref(), to.as_ref());
        if fs::rename(from, to).is_ok() {
            return Ok(());
        }
        fs::copy(from, to)?;
        fs::remove_file(from)
    }

    /// Best-effort removal; returns whether a file was actually deleted
    pub fn remove_quietly<P: AsRef<Path>>(path: P) -> bool {
        let path = path.as_ref();
        match fs::remove_file(path) {
            Ok(()) => {
                debug!("Removed temporary file: {}", path.display());
                true
            }
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!("Could not remove {}: {}", path.display(), e);
                }
                false
            }
        }
    }
}
