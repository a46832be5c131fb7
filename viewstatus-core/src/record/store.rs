use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;
use viewstatus_model::{WatchPercent, WatchState};

use super::{WatchRecord, codec};
use crate::config::DEFAULT_RECORD_FILE_NAME;
use crate::error::{Result, ViewStatusError};
use crate::paths;

/// Result of a monotonic percentage update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The stored value was raised and the record rewritten.
    Raised {
        previous: WatchPercent,
        current: WatchPercent,
    },
    /// The requested value was not higher; nothing was written.
    Unchanged {
        stored: WatchPercent,
        requested: WatchPercent,
    },
}

impl UpdateOutcome {
    pub fn is_raised(&self) -> bool {
        matches!(self, UpdateOutcome::Raised { .. })
    }
}

/// File-backed view records, one hidden file per media directory.
///
/// The store is the only writer of record files. Read-modify-write cycles
/// for the same directory are serialised by a per-directory lock, so two
/// files in one directory finishing at the same moment never lose an
/// update. Different directories do not contend.
#[derive(Debug)]
pub struct WatchRecordStore {
    record_file_name: String,
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl Default for WatchRecordStore {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_FILE_NAME)
    }
}

impl WatchRecordStore {
    pub fn new(record_file_name: impl Into<String>) -> Self {
        Self {
            record_file_name: record_file_name.into(),
            locks: DashMap::new(),
        }
    }

    pub fn record_file_name(&self) -> &str {
        &self.record_file_name
    }

    pub fn record_path(&self, directory: &Path) -> PathBuf {
        directory.join(&self.record_file_name)
    }

    /// Read the record for `directory`.
    ///
    /// A missing file is an empty record. Malformed lines are tolerated by
    /// the codec; only genuine I/O failures are returned.
    pub fn load(&self, directory: &Path) -> Result<WatchRecord> {
        let path = self.record_path(directory);
        match fs::read(&path) {
            Ok(bytes) => Ok(codec::parse(&codec::decode_bytes(&bytes))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no view record yet");
                Ok(WatchRecord::new())
            }
            Err(source) => Err(ViewStatusError::RecordRead { path, source }),
        }
    }

    /// Like [`load`](Self::load) but degrades to an empty record.
    pub fn load_or_default(&self, directory: &Path) -> WatchRecord {
        self.load(directory).unwrap_or_else(|err| {
            warn!(error = %err, "treating unreadable view record as empty");
            WatchRecord::new()
        })
    }

    /// Watch state for one file. Never fails.
    pub fn get(&self, directory: &Path, key: &str) -> WatchState {
        self.load_or_default(directory).state(key)
    }

    /// Raise the stored percentage for `key` if `new_percent` is higher.
    ///
    /// `new_percent` is clamped to `0..=100` first. Nothing is written when
    /// the clamped value does not exceed the stored one.
    pub fn update(
        &self,
        directory: &Path,
        key: &str,
        new_percent: i64,
    ) -> Result<UpdateOutcome> {
        let requested = WatchPercent::clamped(new_percent);

        self.with_directory_lock(directory, || {
            let mut record = self.load(directory)?;
            let Some(previous) = record.raise(key, requested) else {
                let stored = record.percent(key);
                debug!(
                    directory = %directory.display(),
                    file = key,
                    stored = stored.value(),
                    requested = requested.value(),
                    "view record unchanged"
                );
                return Ok(UpdateOutcome::Unchanged { stored, requested });
            };

            self.persist(directory, &record)?;
            debug!(
                directory = %directory.display(),
                file = key,
                previous = previous.value(),
                percent = requested.value(),
                "view record raised"
            );
            Ok(UpdateOutcome::Raised {
                previous,
                current: requested,
            })
        })
    }

    /// Set or clear the directory-wide `allviewed` flag.
    pub fn set_all_viewed(&self, directory: &Path, all_viewed: bool) -> Result<()> {
        self.with_directory_lock(directory, || {
            let mut record = self.load(directory)?;
            if record.all_viewed_flag() == Some(all_viewed) {
                return Ok(());
            }
            record.set_all_viewed(all_viewed);
            self.persist(directory, &record)
        })
    }

    /// Run `f` holding the lock for `directory`.
    ///
    /// The lock entry is dropped again once no other caller holds it, so
    /// the table only contains directories with a write in flight.
    fn with_directory_lock<T>(
        &self,
        directory: &Path,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let canonical = paths::canonical_directory(directory);
        let lock = self
            .locks
            .entry(canonical.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = lock.lock();
            f()
        };

        drop(lock);
        self.locks
            .remove_if(&canonical, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    /// Write the full record through a temp file and rename it into place.
    fn persist(&self, directory: &Path, record: &WatchRecord) -> Result<()> {
        let path = self.record_path(directory);
        let tmp = directory.join(format!(
            "{}.tmp-{}",
            self.record_file_name,
            Uuid::new_v4().simple()
        ));
        let contents = codec::render(record, Utc::now());

        let written = write_file(&tmp, contents.as_bytes())
            .and_then(|()| fs::rename(&tmp, &path));
        if let Err(source) = written {
            let _ = fs::remove_file(&tmp);
            return Err(ViewStatusError::RecordWrite { path, source });
        }
        Ok(())
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
