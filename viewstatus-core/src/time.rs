//! Time abstraction so session lengths can be tested deterministically.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Source of wall-clock time for playback sessions.
pub trait TimeProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Get the current UTC datetime
    fn utc_now(&self) -> DateTime<Utc>;
}

/// Production time provider that uses real system time
#[derive(Clone, Debug, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests and simulations.
///
/// Clones share the same underlying instant.
#[derive(Clone, Debug)]
pub struct VirtualTimeProvider {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl VirtualTimeProvider {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Move virtual time forward.
    pub fn advance(&self, by: Duration) {
        let delta = chrono::Duration::from_std(by)
            .unwrap_or(chrono::Duration::MAX);
        let mut now = self.now.lock();
        *now = now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC);
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }
}

impl Default for VirtualTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for VirtualTimeProvider {
    fn utc_now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
