//! Host-facing entry points.
//!
//! [`ViewStatus`] wires the record store, playback tracker, overlay
//! renderer and thumbnail cache together behind the handful of callbacks a
//! media server invokes: playback started, playback stopped, thumbnail
//! requested, and the enable switch.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};
use viewstatus_model::{MediaKind, ResourceKey, StopOutcome, WatchState};

use crate::config::{FeatureToggle, ViewStatusConfig};
use crate::overlay::{OverlayOutcome, ThumbnailOverlayRenderer};
use crate::playback::PlaybackTracker;
use crate::record::WatchRecordStore;
use crate::thumbnail_cache::{Fingerprint, ThumbnailCache};
use crate::time::TimeProvider;

#[derive(Debug)]
pub struct ViewStatus {
    enabled: FeatureToggle,
    store: Arc<WatchRecordStore>,
    tracker: PlaybackTracker,
    renderer: ThumbnailOverlayRenderer,
    thumbnails: Arc<ThumbnailCache>,
}

impl ViewStatus {
    pub fn new(config: ViewStatusConfig) -> Self {
        let renderer = ThumbnailOverlayRenderer::new(config.overlay.clone());
        Self::with_renderer(config, renderer)
    }

    pub fn with_renderer(
        config: ViewStatusConfig,
        renderer: ThumbnailOverlayRenderer,
    ) -> Self {
        let store = Arc::new(WatchRecordStore::new(config.record_file_name));
        let thumbnails =
            Arc::new(ThumbnailCache::with_capacity(config.thumbnail_cache_capacity));
        let tracker = PlaybackTracker::new(config.enabled.clone(), Arc::clone(&store))
            .with_thumbnail_cache(Arc::clone(&thumbnails));

        Self {
            enabled: config.enabled,
            store,
            tracker,
            renderer,
            thumbnails,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn TimeProvider>) -> Self {
        self.tracker = self.tracker.with_clock(clock);
        self
    }

    pub fn store(&self) -> &WatchRecordStore {
        &self.store
    }

    pub fn tracker(&self) -> &PlaybackTracker {
        &self.tracker
    }

    pub fn thumbnails(&self) -> &ThumbnailCache {
        &self.thumbnails
    }

    pub fn is_feature_enabled(&self) -> bool {
        self.enabled.is_enabled()
    }

    pub fn set_feature_enabled(&self, enabled: bool) {
        debug!(enabled, "view status tracking toggled");
        self.enabled.set_enabled(enabled);
    }

    pub fn on_playback_start(&self, media_path: &Path, kind: MediaKind) {
        match ResourceKey::from_media_path(media_path) {
            Ok(key) => self.tracker.on_start(key, kind),
            Err(err) => warn!(error = %err, "ignoring playback start"),
        }
    }

    pub fn on_playback_stop(
        &self,
        media_path: &Path,
        kind: MediaKind,
        duration_seconds: f64,
    ) -> StopOutcome {
        match ResourceKey::from_media_path(media_path) {
            Ok(key) => self.tracker.on_stop(&key, kind, duration_seconds),
            Err(err) => {
                warn!(error = %err, "ignoring playback stop");
                StopOutcome::NoSession
            }
        }
    }

    /// Set or clear the directory-wide flag and drop stale thumbnails.
    pub fn set_all_viewed(
        &self,
        directory: &Path,
        all_viewed: bool,
    ) -> crate::error::Result<()> {
        self.store.set_all_viewed(directory, all_viewed)?;
        self.thumbnails.invalidate_directory(directory);
        Ok(())
    }

    /// Current watch state for a media file.
    pub fn watch_state(&self, media_path: &Path) -> WatchState {
        match ResourceKey::from_media_path(media_path) {
            Ok(key) => self.store.get(key.directory(), key.file_name()),
            Err(_) => WatchState::default(),
        }
    }

    /// Return the thumbnail to serve for `media_path`.
    ///
    /// `raw` must be the host's own, un-captioned thumbnail. Overlaid results
    /// are cached per base thumbnail until the resource's percentage
    /// changes; failures fall back to `raw`.
    pub fn on_thumbnail_requested(
        &self,
        media_path: &Path,
        raw: Option<&[u8]>,
    ) -> Option<Vec<u8>> {
        let raw = raw?;
        let key = match ResourceKey::from_media_path(media_path) {
            Ok(key) => key,
            Err(err) => {
                warn!(error = %err, "serving thumbnail without overlay");
                return Some(raw.to_vec());
            }
        };

        let source = Fingerprint::of(raw);
        if let Some(cached) = self.thumbnails.get(&key, &source) {
            return Some(cached.to_vec());
        }

        // Read before the state so a concurrent stop keeps this render out.
        let generation = self.thumbnails.generation();
        let state = self.store.get(key.directory(), key.file_name());
        match self.renderer.render(Some(raw), state) {
            OverlayOutcome::Overlaid { bytes, .. } => {
                self.thumbnails.insert_if_current(
                    key,
                    source,
                    bytes.as_slice(),
                    generation,
                );
                Some(bytes)
            }
            outcome => outcome.into_bytes(),
        }
    }
}
