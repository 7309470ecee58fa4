//! Gallery index: the image entries of one directory plus the current selection

use crate::ViewerError;
use image::RgbaImage;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct GalleryEntry {
    pub path: PathBuf,
    pub name: String,
    pub thumbnail: Option<RgbaImage>,
}

impl GalleryEntry {
    fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, name, thumbnail: None }
    }
}

/// Ordered gallery listing.
///
/// Every reload bumps `generation`, so thumbnails computed for an older
/// listing can be recognized and dropped.
#[derive(Debug, Default)]
pub struct GalleryIndex {
    directory: Option<PathBuf>,
    entries: Vec<GalleryEntry>,
    current: Option<usize>,
    generation: u64,
}

impl GalleryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the listing with the supported images in `dir`, sorted by name
    pub fn load_directory(&mut self, dir: &Path) -> Result<usize, ViewerError> {
        let files = view_fs::list_images(dir)?;
        self.entries = files.into_iter().map(|f| GalleryEntry::new(f.path)).collect();
        self.directory = Some(dir.to_path_buf());
        self.current = None;
        self.generation += 1;
        tracing::info!("Gallery: {} images in {}", self.entries.len(), dir.display());
        Ok(self.entries.len())
    }

    /// Replace the listing with a single file. The listing no longer
    /// mirrors a directory, so the next open lists again.
    pub fn set_single(&mut self, path: &Path) {
        self.entries = vec![GalleryEntry::new(path.to_path_buf())];
        self.directory = None;
        self.current = Some(0);
        self.generation += 1;
    }

    /// Select the entry for `path`. Entries share one directory, so the file
    /// name identifies them.
    pub fn select(&mut self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        match self.entries.iter().position(|e| e.path.file_name() == Some(name)) {
            Some(index) => {
                self.current = Some(index);
                true
            }
            None => false,
        }
    }

    pub fn select_index(&mut self, index: usize) -> bool {
        if index < self.entries.len() {
            self.current = Some(index);
            true
        } else {
            false
        }
    }

    /// The entry after the current one, with wrap-around, without selecting
    /// it. `None` when there is nowhere else to go.
    pub fn peek_next(&self) -> Option<(usize, &Path)> {
        self.neighbor(1)
    }

    /// The entry before the current one, with wrap-around, without selecting
    /// it. `None` when there is nowhere else to go.
    pub fn peek_prev(&self) -> Option<(usize, &Path)> {
        self.neighbor(-1)
    }

    fn neighbor(&self, delta: isize) -> Option<(usize, &Path)> {
        let len = self.entries.len();
        if len <= 1 {
            return None;
        }
        let index = match self.current {
            Some(current) => (current as isize + delta).rem_euclid(len as isize) as usize,
            None if delta > 0 => 0,
            None => len - 1,
        };
        Some((index, self.entries[index].path.as_path()))
    }

    /// Take over `other`'s listing and selection. The generation still moves
    /// forward, so thumbnails queued for either listing are dropped.
    pub fn replace_with(&mut self, other: GalleryIndex) {
        let generation = self.generation.max(other.generation) + 1;
        *self = other;
        self.generation = generation;
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current.map(|i| self.entries[i].path.as_path())
    }

    pub fn first_path(&self) -> Option<&Path> {
        self.entries.first().map(|e| e.path.as_path())
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Attach a finished thumbnail. Returns `false` if the listing it was made
    /// for is gone or no longer holds `path`.
    pub fn set_thumbnail(&mut self, generation: u64, path: &Path, thumbnail: RgbaImage) -> bool {
        if generation != self.generation {
            return false;
        }
        match self.entries.iter_mut().find(|e| e.path == path) {
            Some(entry) => {
                entry.thumbnail = Some(thumbnail);
                true
            }
            None => false,
        }
    }
}
