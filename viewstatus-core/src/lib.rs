//! # ViewStatus Core
//!
//! Keeps track of how much of each video a user has watched and shows it on
//! the video's thumbnail.
//!
//! ## Overview
//!
//! - **Record store**: one hidden properties file per media directory maps
//!   file names to the highest percentage ever watched ([`record`]).
//! - **Playback tracking**: start and stop events are paired per resource
//!   and turned into a percentage of the media duration ([`playback`]).
//! - **Thumbnail overlays**: a translucent caption bar reading `viewed` or
//!   `viewed for N%` is burned onto thumbnails ([`overlay`]).
//! - **Host facade**: [`ViewStatus`] exposes the callbacks a media server
//!   invokes and owns the shared pieces.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use viewstatus_core::{ViewStatus, config::ConfigLoader};
//! use viewstatus_model::MediaKind;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let load = ConfigLoader::new().load()?;
//! let status = ViewStatus::new(load.config);
//!
//! let movie = Path::new("/media/films/Heat (1995).mkv");
//! status.on_playback_start(movie, MediaKind::Video);
//! // ... later, when the host reports the stop:
//! let outcome = status.on_playback_stop(movie, MediaKind::Video, 10_200.0);
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod overlay;
mod paths;
pub mod playback;
pub mod record;
pub mod service;
pub mod thumbnail_cache;
pub mod time;

pub use error::{Result, ViewStatusError};
pub use overlay::{OverlayOutcome, ThumbnailOverlayRenderer};
pub use playback::{PlaybackSession, PlaybackTracker};
pub use record::{UpdateOutcome, WatchRecord, WatchRecordStore};
pub use service::ViewStatus;
pub use thumbnail_cache::{Fingerprint, ThumbnailCache};
