//! Background thumbnail generation for the gallery
//!
//! Decoding runs on a rayon pool. Finished thumbnails come back over a
//! crossbeam channel and are attached on the caller's thread by
//! [`ThumbnailPump::drain_into`]; workers never see the gallery.

use crate::gallery::GalleryIndex;
use crate::image_loader;
use crate::ViewerError;
use crossbeam_channel::{Receiver, Sender};
use image::RgbaImage;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

const MEMORY_CACHE_LIMIT: usize = 256;

/// One finished (or failed) thumbnail
#[derive(Debug)]
pub struct ThumbnailDone {
    pub generation: u64,
    pub path: PathBuf,
    pub result: Result<RgbaImage, ViewerError>,
}

pub struct ThumbnailPump {
    pool: rayon::ThreadPool,
    size: u32,
    tx: Sender<ThumbnailDone>,
    rx: Receiver<ThumbnailDone>,
    /// Decoded thumbnails by path hash, reused across gallery reloads
    memory_cache: LruCache<u64, RgbaImage>,
    pending: usize,
}

impl ThumbnailPump {
    /// `threads == 0` lets rayon pick one worker per core
    pub fn new(size: u32, threads: usize) -> Result<Self, ViewerError> {
        Self::with_cache_limit(size, threads, MEMORY_CACHE_LIMIT)
    }

    /// Like [`ThumbnailPump::new`], keeping at most `cache_limit` decoded
    /// thumbnails (at least one) in memory
    pub fn with_cache_limit(size: u32, threads: usize, cache_limit: usize) -> Result<Self, ViewerError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("thumbnail-{}", i))
            .build()
            .map_err(|e| ViewerError::SystemResource(format!("thumbnail pool: {}", e)))?;
        let (tx, rx) = crossbeam_channel::unbounded();

        Ok(Self {
            pool,
            size: size.max(1),
            tx,
            rx,
            memory_cache: LruCache::new(NonZeroUsize::new(cache_limit).unwrap_or(NonZeroUsize::MIN)),
            pending: 0,
        })
    }

    /// Requests still in flight
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Queue every entry that has no thumbnail yet. Entries found in the
    /// memory cache are attached right away. Returns the number queued.
    pub fn request_all(&mut self, gallery: &mut GalleryIndex) -> usize {
        let generation = gallery.generation();
        let mut missing = Vec::new();
        for entry in gallery.entries().iter().filter(|e| e.thumbnail.is_none()) {
            missing.push(entry.path.clone());
        }

        let mut queued = 0;
        for path in missing {
            let key = self.cache_key(&path);
            if let Some(cached) = self.memory_cache.get(&key) {
                gallery.set_thumbnail(generation, &path, cached.clone());
                continue;
            }
            self.spawn(generation, path);
            queued += 1;
        }

        tracing::debug!("Queued {} thumbnails (generation {})", queued, generation);
        queued
    }

    fn spawn(&mut self, generation: u64, path: PathBuf) {
        let tx = self.tx.clone();
        let size = self.size;
        self.pending += 1;
        self.pool.spawn(move || {
            let result = image_loader::load_thumbnail(&path, size);
            // Receiver lives as long as the pump; a send error means it was dropped
            let _ = tx.send(ThumbnailDone { generation, path, result });
        });
    }

    /// Attach every result that has arrived so far, without blocking.
    /// Returns how many thumbnails were attached.
    pub fn drain_into(&mut self, gallery: &mut GalleryIndex) -> usize {
        let mut attached = 0;
        while let Ok(done) = self.rx.try_recv() {
            if self.accept(done, gallery) {
                attached += 1;
            }
        }
        attached
    }

    /// Block until every queued request has completed, attaching as they come
    pub fn wait_into(&mut self, gallery: &mut GalleryIndex) -> usize {
        let mut attached = 0;
        while self.pending > 0 {
            match self.rx.recv() {
                Ok(done) => {
                    if self.accept(done, gallery) {
                        attached += 1;
                    }
                }
                Err(_) => break,
            }
        }
        attached
    }

    fn accept(&mut self, done: ThumbnailDone, gallery: &mut GalleryIndex) -> bool {
        self.pending = self.pending.saturating_sub(1);
        match done.result {
            Ok(thumbnail) => {
                self.remember(&done.path, &thumbnail);
                let attached = gallery.set_thumbnail(done.generation, &done.path, thumbnail);
                if !attached {
                    tracing::debug!("Dropped stale thumbnail for {}", done.path.display());
                }
                attached
            }
            Err(e) => {
                tracing::warn!("Thumbnail failed for {}: {}", done.path.display(), e);
                false
            }
        }
    }

    fn remember(&mut self, path: &Path, thumbnail: &RgbaImage) {
        let key = self.cache_key(path);
        if let Some((evicted, _)) = self.memory_cache.push(key, thumbnail.clone()) {
            if evicted != key {
                tracing::trace!("Evicted thumbnail {:016x} from memory cache", evicted);
            }
        }
    }

    fn cache_key(&self, path: &Path) -> u64 {
        let path_str = path.to_string_lossy();
        xxh3_64(path_str.as_bytes()) ^ u64::from(self.size)
    }

    pub fn cached_count(&self) -> usize {
        self.memory_cache.len()
    }

    /// Whether a thumbnail for `path` is held in memory. Does not touch
    /// the recency order.
    pub fn is_cached(&self, path: &Path) -> bool {
        self.memory_cache.contains(&self.cache_key(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    fn gallery_of_pngs(sizes: &[(u32, u32)]) -> (TempDir, GalleryIndex) {
        let temp_dir = TempDir::new().unwrap();
        for (i, (w, h)) in sizes.iter().enumerate() {
            RgbaImage::from_pixel(*w, *h, Rgba([i as u8, 0, 0, 255]))
                .save(temp_dir.path().join(format!("img{}.png", i)))
                .unwrap();
        }
        let mut gallery = GalleryIndex::new();
        gallery.load_directory(temp_dir.path()).unwrap();
        (temp_dir, gallery)
    }

    #[test]
    fn test_thumbnails_attached_on_drain() {
        let (_dir, mut gallery) = gallery_of_pngs(&[(300, 150), (40, 80)]);
        let mut pump = ThumbnailPump::new(64, 2).unwrap();

        assert_eq!(pump.request_all(&mut gallery), 2);
        assert_eq!(pump.wait_into(&mut gallery), 2);
        assert_eq!(pump.pending(), 0);

        let dims: Vec<_> = gallery
            .entries()
            .iter()
            .map(|e| e.thumbnail.as_ref().unwrap().dimensions())
            .collect();
        assert_eq!(dims, [(64, 32), (32, 64)]);
    }

    #[test]
    fn test_results_for_reloaded_gallery_are_dropped() {
        let (dir, mut gallery) = gallery_of_pngs(&[(20, 20)]);
        let mut pump = ThumbnailPump::new(16, 1).unwrap();

        pump.request_all(&mut gallery);
        gallery.load_directory(dir.path()).unwrap();
        assert_eq!(pump.wait_into(&mut gallery), 0);
        assert!(gallery.entries()[0].thumbnail.is_none());

        // A second request is served from the memory cache
        assert_eq!(pump.request_all(&mut gallery), 0);
        assert!(gallery.entries()[0].thumbnail.is_some());
    }

    #[test]
    fn test_failed_decode_is_not_attached() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("bad.png"), b"nope").unwrap();
        let mut gallery = GalleryIndex::new();
        gallery.load_directory(temp_dir.path()).unwrap();

        let mut pump = ThumbnailPump::new(32, 1).unwrap();
        pump.request_all(&mut gallery);
        assert_eq!(pump.wait_into(&mut gallery), 0);
        assert_eq!(pump.pending(), 0);
        assert_eq!(pump.cached_count(), 0);
    }

    #[test]
    fn test_memory_cache_evicts_least_recently_used() {
        let (dir, mut gallery) = gallery_of_pngs(&[(8, 8), (8, 8), (8, 8)]);
        let path = |i: usize| dir.path().join(format!("img{}.png", i));
        let mut pump = ThumbnailPump::with_cache_limit(8, 1, 2).unwrap();

        // Fill the cache with img0 and img1 only
        gallery.set_single(&path(0));
        pump.request_all(&mut gallery);
        pump.wait_into(&mut gallery);
        gallery.set_single(&path(1));
        pump.request_all(&mut gallery);
        pump.wait_into(&mut gallery);
        assert_eq!(pump.cached_count(), 2);

        // A cache hit on img0 makes img1 the oldest entry
        gallery.set_single(&path(0));
        assert_eq!(pump.request_all(&mut gallery), 0);

        gallery.set_single(&path(2));
        assert_eq!(pump.request_all(&mut gallery), 1);
        pump.wait_into(&mut gallery);

        assert_eq!(pump.cached_count(), 2);
        assert!(pump.is_cached(&path(0)));
        assert!(!pump.is_cached(&path(1)));
        assert!(pump.is_cached(&path(2)));
    }

    #[test]
    fn test_zero_cache_limit_keeps_one_entry() {
        let (_dir, mut gallery) = gallery_of_pngs(&[(8, 8), (8, 8)]);
        let mut pump = ThumbnailPump::with_cache_limit(8, 1, 0).unwrap();
        pump.request_all(&mut gallery);
        assert_eq!(pump.wait_into(&mut gallery), 2);
        assert_eq!(pump.cached_count(), 1);
    }

    #[test]
    fn test_drain_without_requests() {
        let mut gallery = GalleryIndex::new();
        let mut pump = ThumbnailPump::new(32, 1).unwrap();
        assert_eq!(pump.drain_into(&mut gallery), 0);
    }
}
