//! Start/stop bookkeeping that turns playback time into watch percentages.

mod tracker;

use chrono::{DateTime, Utc};
use viewstatus_model::ResourceKey;

pub use tracker::PlaybackTracker;

/// One in-progress playback, open between a start and its matching stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSession {
    pub key: ResourceKey,
    pub started_at: DateTime<Utc>,
}

impl PlaybackSession {
    /// Seconds between the start and `now`; never negative.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> f64 {
        let elapsed = now - self.started_at;
        let seconds = elapsed.num_milliseconds() as f64 / 1000.0;
        seconds.max(0.0)
    }
}
