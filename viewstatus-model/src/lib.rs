//! Core data model definitions shared across view status crates.
#![allow(missing_docs)]

pub mod error;
pub mod media;
pub mod prelude;
pub mod watch;

pub use error::{ModelError, Result as ModelResult};
pub use media::{MediaKind, ResourceKey};
pub use watch::{Caption, StopOutcome, WatchPercent, WatchState};
