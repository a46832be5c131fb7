//! Start/stop pairing and percentage computation.

mod support;

use std::sync::Arc;
use std::time::Duration;

use support::MediaDir;
use viewstatus_core::{
    Fingerprint, PlaybackTracker, ThumbnailCache, WatchRecordStore,
    config::FeatureToggle, time::VirtualTimeProvider,
};
use viewstatus_model::{MediaKind, StopOutcome, WatchPercent};

struct Harness {
    dir: MediaDir,
    clock: VirtualTimeProvider,
    toggle: FeatureToggle,
    store: Arc<WatchRecordStore>,
    cache: Arc<ThumbnailCache>,
    tracker: PlaybackTracker,
}

fn harness() -> Harness {
    let dir = MediaDir::new();
    let clock = VirtualTimeProvider::new();
    let toggle = FeatureToggle::new(true);
    let store = Arc::new(WatchRecordStore::default());
    let cache = Arc::new(ThumbnailCache::new());
    let tracker = PlaybackTracker::new(toggle.clone(), Arc::clone(&store))
        .with_clock(Arc::new(clock.clone()))
        .with_thumbnail_cache(Arc::clone(&cache));
    Harness {
        dir,
        clock,
        toggle,
        store,
        cache,
        tracker,
    }
}

fn percent(value: i64) -> WatchPercent {
    WatchPercent::clamped(value)
}

#[test]
fn half_of_a_two_minute_video_records_fifty() {
    let h = harness();
    let key = h.dir.key("clip.mp4");

    h.tracker.on_start(key.clone(), MediaKind::Video);
    assert!(h.tracker.is_playing(&key));
    h.clock.advance(Duration::from_secs(60));
    let outcome = h.tracker.on_stop(&key, MediaKind::Video, 120.0);

    assert_eq!(
        outcome,
        StopOutcome::Recorded {
            previous: percent(0),
            current: percent(50),
        }
    );
    assert!(!h.tracker.is_playing(&key));
    assert_eq!(h.store.get(h.dir.path(), "clip.mp4").percent.value(), 50);
}

#[test]
fn percentage_is_truncated_not_rounded() {
    let h = harness();
    let key = h.dir.key("clip.mp4");

    h.tracker.on_start(key.clone(), MediaKind::Video);
    h.clock.advance(Duration::from_millis(119_900));
    h.tracker.on_stop(&key, MediaKind::Video, 120.0);

    assert_eq!(h.store.get(h.dir.path(), "clip.mp4").percent.value(), 99);
}

#[test]
fn overlong_sessions_cap_at_one_hundred() {
    let h = harness();
    let key = h.dir.key("clip.mp4");

    h.tracker.on_start(key.clone(), MediaKind::Video);
    h.clock.advance(Duration::from_secs(3 * 3600));
    h.tracker.on_stop(&key, MediaKind::Video, 120.0);

    assert_eq!(h.store.get(h.dir.path(), "clip.mp4").percent, WatchPercent::FULL);
}

#[test]
fn shorter_replay_does_not_lower_progress() {
    let h = harness();
    let key = h.dir.key("film.mkv");

    h.tracker.on_start(key.clone(), MediaKind::Video);
    h.clock.advance(Duration::from_secs(90));
    h.tracker.on_stop(&key, MediaKind::Video, 100.0);

    h.tracker.on_start(key.clone(), MediaKind::Video);
    h.clock.advance(Duration::from_secs(10));
    let outcome = h.tracker.on_stop(&key, MediaKind::Video, 100.0);

    assert_eq!(
        outcome,
        StopOutcome::Unchanged {
            stored: percent(90),
            computed: percent(10),
        }
    );
    assert_eq!(h.store.get(h.dir.path(), "film.mkv").percent.value(), 90);
}

#[test]
fn unknown_duration_skips_the_update() {
    let h = harness();
    let key = h.dir.key("live.ts");

    for duration in [0.0, -1.0, f64::NAN] {
        h.tracker.on_start(key.clone(), MediaKind::Video);
        h.clock.advance(Duration::from_secs(30));
        assert_eq!(
            h.tracker.on_stop(&key, MediaKind::Video, duration),
            StopOutcome::UnknownDuration
        );
        assert!(!h.tracker.is_playing(&key));
    }
    assert!(h.dir.record_text().is_none());
}

#[test]
fn stop_without_start_is_a_no_op() {
    let h = harness();
    let key = h.dir.key("clip.mp4");

    assert_eq!(
        h.tracker.on_stop(&key, MediaKind::Video, 120.0),
        StopOutcome::NoSession
    );
    assert!(h.dir.record_text().is_none());
}

#[test]
fn non_video_resources_are_ignored() {
    let h = harness();
    let key = h.dir.key("song.flac");

    h.tracker.on_start(key.clone(), MediaKind::Audio);
    assert_eq!(h.tracker.open_sessions(), 0);
    assert_eq!(
        h.tracker.on_stop(&key, MediaKind::Audio, 200.0),
        StopOutcome::NotVideo
    );
}

#[test]
fn disabled_tracking_ignores_events() {
    let h = harness();
    let key = h.dir.key("clip.mp4");
    h.toggle.set_enabled(false);

    h.tracker.on_start(key.clone(), MediaKind::Video);
    assert_eq!(h.tracker.open_sessions(), 0);
    assert_eq!(
        h.tracker.on_stop(&key, MediaKind::Video, 120.0),
        StopOutcome::Disabled
    );
}

#[test]
fn disabling_mid_session_drops_the_session() {
    let h = harness();
    let key = h.dir.key("clip.mp4");

    h.tracker.on_start(key.clone(), MediaKind::Video);
    h.toggle.set_enabled(false);
    h.clock.advance(Duration::from_secs(60));
    assert_eq!(
        h.tracker.on_stop(&key, MediaKind::Video, 120.0),
        StopOutcome::Disabled
    );

    h.toggle.set_enabled(true);
    assert_eq!(
        h.tracker.on_stop(&key, MediaKind::Video, 120.0),
        StopOutcome::NoSession
    );
    assert!(h.dir.record_text().is_none());
}

#[test]
fn interleaved_sessions_are_attributed_to_their_own_resource() {
    let h = harness();
    let first = h.dir.key("first.mkv");
    let second = h.dir.key("second.mkv");

    // first starts, second starts 30s later, first stops 60s after that,
    // second stops 30s later. A FIFO pairing would swap the durations.
    h.tracker.on_start(first.clone(), MediaKind::Video);
    h.clock.advance(Duration::from_secs(30));
    h.tracker.on_start(second.clone(), MediaKind::Video);
    assert_eq!(h.tracker.open_sessions(), 2);
    h.clock.advance(Duration::from_secs(60));
    h.tracker.on_stop(&second, MediaKind::Video, 100.0);
    h.clock.advance(Duration::from_secs(30));
    h.tracker.on_stop(&first, MediaKind::Video, 200.0);

    assert_eq!(h.store.get(h.dir.path(), "second.mkv").percent.value(), 60);
    assert_eq!(h.store.get(h.dir.path(), "first.mkv").percent.value(), 60);
    assert_eq!(h.tracker.open_sessions(), 0);
}

#[test]
fn restarting_playback_resets_the_start_time() {
    let h = harness();
    let key = h.dir.key("clip.mp4");

    h.tracker.on_start(key.clone(), MediaKind::Video);
    h.clock.advance(Duration::from_secs(80));
    h.tracker.on_start(key.clone(), MediaKind::Video);
    h.clock.advance(Duration::from_secs(20));
    h.tracker.on_stop(&key, MediaKind::Video, 100.0);

    assert_eq!(h.store.get(h.dir.path(), "clip.mp4").percent.value(), 20);
}

#[test]
fn raising_progress_invalidates_the_cached_thumbnail() {
    let h = harness();
    let key = h.dir.key("clip.mp4");
    let source = Fingerprint::of(b"base thumbnail");
    h.cache.insert(key.clone(), source, vec![0xFF, 0xD8]);

    h.tracker.on_start(key.clone(), MediaKind::Video);
    h.clock.advance(Duration::from_secs(10));
    h.tracker.on_stop(&key, MediaKind::Video, 100.0);
    assert!(h.cache.get(&key, &source).is_none());

    // An update that does not raise the value keeps the cache entry.
    h.cache.insert(key.clone(), source, vec![0xFF, 0xD8]);
    h.tracker.on_start(key.clone(), MediaKind::Video);
    h.clock.advance(Duration::from_secs(5));
    h.tracker.on_stop(&key, MediaKind::Video, 100.0);
    assert!(h.cache.get(&key, &source).is_some());
}

#[test]
fn persist_failure_is_reported_and_the_session_closed() {
    let h = harness();
    let gone = h.dir.path().join("removed");
    let key = viewstatus_model::ResourceKey::new(&gone, "clip.mp4").unwrap();

    h.tracker.on_start(key.clone(), MediaKind::Video);
    h.clock.advance(Duration::from_secs(50));
    assert_eq!(
        h.tracker.on_stop(&key, MediaKind::Video, 100.0),
        StopOutcome::PersistFailed {
            computed: percent(50)
        }
    );
    assert!(!h.tracker.is_playing(&key));
}
