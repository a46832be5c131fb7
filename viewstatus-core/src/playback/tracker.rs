use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, error, info};
use viewstatus_model::{MediaKind, ResourceKey, StopOutcome, WatchPercent};

use super::PlaybackSession;
use crate::config::FeatureToggle;
use crate::record::{UpdateOutcome, WatchRecordStore};
use crate::thumbnail_cache::ThumbnailCache;
use crate::time::{SystemTimeProvider, TimeProvider};

/// Pairs playback start and stop events and records how much was watched.
///
/// Open sessions are indexed by [`ResourceKey`], so any number of items can
/// play at once without their elapsed times being mixed up. A stop event
/// only ever closes the session opened by the start of the same resource.
#[derive(Debug)]
pub struct PlaybackTracker {
    enabled: FeatureToggle,
    store: Arc<WatchRecordStore>,
    clock: Arc<dyn TimeProvider>,
    sessions: DashMap<ResourceKey, PlaybackSession>,
    thumbnails: Option<Arc<ThumbnailCache>>,
}

impl PlaybackTracker {
    pub fn new(enabled: FeatureToggle, store: Arc<WatchRecordStore>) -> Self {
        Self {
            enabled,
            store,
            clock: Arc::new(SystemTimeProvider),
            sessions: DashMap::new(),
            thumbnails: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn TimeProvider>) -> Self {
        self.clock = clock;
        self
    }

    /// Cache whose entries are dropped when a stop raises the percentage.
    pub fn with_thumbnail_cache(mut self, cache: Arc<ThumbnailCache>) -> Self {
        self.thumbnails = Some(cache);
        self
    }

    pub fn store(&self) -> &Arc<WatchRecordStore> {
        &self.store
    }

    pub fn is_playing(&self, key: &ResourceKey) -> bool {
        self.sessions.contains_key(key)
    }

    pub fn open_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Open a session for `key`. A second start restarts the session.
    pub fn on_start(&self, key: ResourceKey, kind: MediaKind) {
        if !self.enabled.is_enabled() || !kind.is_video() {
            return;
        }

        let started_at = self.clock.utc_now();
        debug!(resource = %key, %started_at, "playback started");
        self.sessions
            .insert(key.clone(), PlaybackSession { key, started_at });
    }

    /// Close the session for `key` and record the watched percentage.
    pub fn on_stop(
        &self,
        key: &ResourceKey,
        kind: MediaKind,
        duration_seconds: f64,
    ) -> StopOutcome {
        if !self.enabled.is_enabled() {
            // Drop anything opened before tracking was switched off.
            self.sessions.remove(key);
            return StopOutcome::Disabled;
        }
        if !kind.is_video() {
            return StopOutcome::NotVideo;
        }
        let Some((_, session)) = self.sessions.remove(key) else {
            debug!(resource = %key, "stop without matching start");
            return StopOutcome::NoSession;
        };

        let elapsed = session.elapsed_seconds(self.clock.utc_now());
        let Some(computed) = WatchPercent::from_ratio(elapsed, duration_seconds)
        else {
            debug!(
                resource = %key,
                duration_seconds,
                "duration unknown, skipping view record update"
            );
            return StopOutcome::UnknownDuration;
        };

        debug!(
            resource = %key,
            elapsed_seconds = elapsed,
            duration_seconds,
            percent = computed.value(),
            "playback stopped"
        );

        match self.store.update(
            key.directory(),
            key.file_name(),
            i64::from(computed.value()),
        ) {
            Ok(UpdateOutcome::Raised { previous, current }) => {
                info!(
                    resource = %key,
                    previous = previous.value(),
                    percent = current.value(),
                    "recorded watch progress"
                );
                if let Some(cache) = &self.thumbnails {
                    cache.invalidate(key);
                }
                StopOutcome::Recorded { previous, current }
            }
            Ok(UpdateOutcome::Unchanged { stored, .. }) => {
                StopOutcome::Unchanged { stored, computed }
            }
            Err(err) => {
                error!(
                    resource = %key,
                    percent = computed.value(),
                    error = %err,
                    "failed to persist watch progress"
                );
                StopOutcome::PersistFailed { computed }
            }
        }
    }
}
