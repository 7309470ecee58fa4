//! Directory browser - image listing for the gallery

use crate::{FsError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions the gallery lists (compared case-insensitively)
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "bmp", "gif", "tiff", "tif", "webp",
];

/// File entry with metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub modified: Option<i64>,
    pub extension: String,
}

impl FileEntry {
    /// Create a new file entry from path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound(path.display().to_string()),
            std::io::ErrorKind::PermissionDenied => FsError::AccessDenied(path.display().to_string()),
            _ => FsError::Io(e),
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64);

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: metadata.len(),
            modified,
            extension,
        })
    }

    /// Check if this is an image file the viewer can open
    pub fn is_image(&self) -> bool {
        SUPPORTED_EXTENSIONS.contains(&self.extension.as_str())
    }
}

/// Check if a path carries a supported image extension
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// List the image files of a directory, ordered by file name.
///
/// Hidden files and subdirectories are skipped. Entries that vanish or
/// cannot be stat'ed while listing are skipped as well.
pub fn list_images<P: AsRef<Path>>(dir: P) -> Result<Vec<FileEntry>> {
    let dir = dir.as_ref();

    if !dir.exists() {
        return Err(FsError::NotFound(dir.display().to_string()));
    }

    if !dir.is_dir() {
        return Err(FsError::InvalidPath(format!("Not a directory: {}", dir.display())));
    }

    let mut entries = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() || !is_supported_image(&path) {
            continue;
        }

        let file_entry = match FileEntry::from_path(&path) {
            Ok(e) => e,
            Err(_) => continue,
        };

        if file_entry.name.starts_with('.') {
            continue;
        }

        entries.push(file_entry);
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));

    tracing::debug!("Listed {} images in {}", entries.len(), dir.display());
    Ok(entries)
}
