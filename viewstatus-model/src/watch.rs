//! Watch percentages and the captions derived from them.

use std::fmt::{self, Display, Formatter};

use crate::error::ModelError;

/// Integer watch percentage, always within `0..=100`.
///
/// Every constructor clamps, so an out-of-range value cannot be built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct WatchPercent(u8);

impl WatchPercent {
    pub const ZERO: WatchPercent = WatchPercent(0);
    pub const FULL: WatchPercent = WatchPercent(100);

    pub fn clamped(value: i64) -> Self {
        WatchPercent(value.clamp(0, 100) as u8)
    }

    /// Percentage of `watched` over `total`, truncated toward zero.
    ///
    /// Returns `None` when `total` is not a positive finite number.
    pub fn from_ratio(watched: f64, total: f64) -> Option<Self> {
        if !total.is_finite() || total <= 0.0 {
            return None;
        }
        let fraction = (watched / total * 100.0).clamp(0.0, 100.0);
        if fraction.is_nan() {
            return Some(WatchPercent::ZERO);
        }
        Some(WatchPercent(fraction.trunc() as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Display for WatchPercent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl From<WatchPercent> for u8 {
    fn from(value: WatchPercent) -> Self {
        value.0
    }
}

impl TryFrom<u8> for WatchPercent {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 100 {
            return Err(ModelError::PercentOutOfRange(value));
        }
        Ok(WatchPercent(value))
    }
}

/// Watch state of one file as read from its directory record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WatchState {
    pub percent: WatchPercent,
    /// Directory-wide flag; overrides the per-file percentage when set.
    pub all_viewed: bool,
}

impl WatchState {
    pub fn new(percent: WatchPercent, all_viewed: bool) -> Self {
        Self {
            percent,
            all_viewed,
        }
    }

    pub fn caption(&self) -> Option<Caption> {
        if self.all_viewed {
            Some(Caption::Viewed)
        } else if !self.percent.is_zero() {
            Some(Caption::ViewedFor(self.percent))
        } else {
            None
        }
    }
}

/// Text burned onto a thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caption {
    Viewed,
    ViewedFor(WatchPercent),
}

impl Display for Caption {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Caption::Viewed => write!(f, "viewed"),
            Caption::ViewedFor(percent) => write!(f, "viewed for {percent}"),
        }
    }
}

/// What handling a playback stop event amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "outcome", rename_all = "snake_case")
)]
pub enum StopOutcome {
    /// Tracking is switched off.
    Disabled,
    /// The resource is not a video.
    NotVideo,
    /// No start event was seen for this resource.
    NoSession,
    /// Duration was zero, negative or not finite.
    UnknownDuration,
    /// The computed percentage did not exceed the stored one.
    Unchanged {
        stored: WatchPercent,
        computed: WatchPercent,
    },
    /// The stored percentage was raised.
    Recorded {
        previous: WatchPercent,
        current: WatchPercent,
    },
    /// The record could not be written; progress for this stop is lost.
    PersistFailed { computed: WatchPercent },
}

impl StopOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, StopOutcome::Recorded { .. })
    }
}
