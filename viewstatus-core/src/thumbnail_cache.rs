//! Bounded cache of captioned thumbnails.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tracing::debug;
use viewstatus_model::ResourceKey;

use crate::paths;

/// Entries kept when no capacity is configured.
pub const DEFAULT_THUMBNAIL_CACHE_CAPACITY: usize = 256;

/// Identity of the base thumbnail an overlay was rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    len: usize,
    digest: [u8; 32],
}

impl Fingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&Sha256::digest(bytes));
        Self {
            len: bytes.len(),
            digest,
        }
    }
}

#[derive(Debug)]
struct CachedThumbnail {
    source: Fingerprint,
    bytes: Arc<[u8]>,
    last_used: AtomicU64,
}

/// Overlaid thumbnails keyed by resource.
///
/// An entry is only served for the exact base thumbnail it was rendered
/// from, so a host that hands over a new frame, size or format gets a fresh
/// render. Every invalidation bumps a generation counter; renders that
/// started before an invalidation are not cached. When full, the least
/// recently used entry is evicted.
#[derive(Debug)]
pub struct ThumbnailCache {
    entries: DashMap<ResourceKey, CachedThumbnail>,
    capacity: usize,
    generation: AtomicU64,
    uses: AtomicU64,
}

impl Default for ThumbnailCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_THUMBNAIL_CACHE_CAPACITY)
    }
}

impl ThumbnailCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            generation: AtomicU64::new(0),
            uses: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current invalidation generation, for [`insert_if_current`].
    ///
    /// [`insert_if_current`]: Self::insert_if_current
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Cached overlay for `key` if it was rendered from `source`.
    pub fn get(&self, key: &ResourceKey, source: &Fingerprint) -> Option<Arc<[u8]>> {
        let entry = self.entries.get(&paths::canonical_key(key))?;
        if entry.source != *source {
            return None;
        }
        entry.last_used.store(self.tick(), Ordering::Relaxed);
        Some(Arc::clone(&entry.bytes))
    }

    pub fn insert(
        &self,
        key: ResourceKey,
        source: Fingerprint,
        bytes: impl Into<Arc<[u8]>>,
    ) {
        self.entries
            .insert(paths::canonical_key(&key), self.cached(source, bytes.into()));
        self.evict_over_capacity();
    }

    /// Insert unless something was invalidated since `generation` was read.
    ///
    /// The generation check runs under the entry's shard lock, so an
    /// invalidation either rejects this insert or removes it afterwards.
    pub fn insert_if_current(
        &self,
        key: ResourceKey,
        source: Fingerprint,
        bytes: impl Into<Arc<[u8]>>,
        generation: u64,
    ) -> bool {
        let entry = self.entries.entry(paths::canonical_key(&key));
        if self.generation() != generation {
            debug!(resource = %key, "thumbnail invalidated during render, not caching");
            return false;
        }
        entry.insert(self.cached(source, bytes.into()));
        self.evict_over_capacity();
        true
    }

    /// Returns whether an entry was present.
    pub fn invalidate(&self, key: &ResourceKey) -> bool {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.remove(&paths::canonical_key(key)).is_some()
    }

    /// Drop every entry for files in `directory`.
    pub fn invalidate_directory(&self, directory: &Path) -> usize {
        let directory = paths::canonical_directory(directory);
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut removed = 0;
        self.entries.retain(|key, _| {
            let keep = key.directory() != directory;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn cached(&self, source: Fingerprint, bytes: Arc<[u8]>) -> CachedThumbnail {
        CachedThumbnail {
            source,
            bytes,
            last_used: AtomicU64::new(self.tick()),
        }
    }

    fn tick(&self) -> u64 {
        self.uses.fetch_add(1, Ordering::Relaxed)
    }

    fn evict_over_capacity(&self) {
        while self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.last_used.load(Ordering::Relaxed))
                .map(|entry| entry.key().clone());
            let Some(oldest) = oldest else {
                break;
            };
            debug!(resource = %oldest, "evicting cached thumbnail");
            self.entries.remove(&oldest);
        }
    }
}
