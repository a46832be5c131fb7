pub use crate::error::{ModelError, Result as ModelResult};
pub use crate::media::{MediaKind, ResourceKey};
pub use crate::watch::{Caption, StopOutcome, WatchPercent, WatchState};
