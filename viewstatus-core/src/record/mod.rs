//! Per-directory view records.
//!
//! Every media directory owns one hidden record file mapping file names to
//! the highest percentage ever watched, plus an optional directory-wide
//! `allviewed` flag.

pub mod codec;
mod store;

use std::collections::BTreeMap;

use viewstatus_model::{WatchPercent, WatchState};

pub use store::{UpdateOutcome, WatchRecordStore};

/// Reserved key holding the directory-wide flag.
pub const ALL_VIEWED_KEY: &str = "allviewed";

/// In-memory form of one directory's record file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchRecord {
    entries: BTreeMap<String, WatchPercent>,
    all_viewed: Option<bool>,
    /// Keys whose value is not an integer, kept verbatim for rewriting.
    unparsed: BTreeMap<String, String>,
}

impl WatchRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one raw pair read from disk into the record. Later pairs win.
    pub(crate) fn apply_raw(&mut self, key: String, value: String) {
        if key == ALL_VIEWED_KEY {
            self.all_viewed = Some(value.trim() == "true");
            return;
        }
        match value.trim().parse::<i64>() {
            Ok(parsed) => {
                self.unparsed.remove(&key);
                self.entries.insert(key, WatchPercent::clamped(parsed));
            }
            Err(_) => {
                self.entries.remove(&key);
                self.unparsed.insert(key, value);
            }
        }
    }

    /// Stored percentage for `key`; absent or unparsable values read as 0.
    pub fn percent(&self, key: &str) -> WatchPercent {
        self.entries.get(key).copied().unwrap_or_default()
    }

    pub fn all_viewed(&self) -> bool {
        self.all_viewed.unwrap_or(false)
    }

    /// The flag as stored, `None` when the record never mentioned it.
    pub fn all_viewed_flag(&self) -> Option<bool> {
        self.all_viewed
    }

    pub fn state(&self, key: &str) -> WatchState {
        WatchState::new(self.percent(key), self.all_viewed())
    }

    pub fn set_percent(&mut self, key: impl Into<String>, percent: WatchPercent) {
        let key = key.into();
        self.unparsed.remove(&key);
        self.entries.insert(key, percent);
    }

    pub fn set_all_viewed(&mut self, all_viewed: bool) {
        self.all_viewed = Some(all_viewed);
    }

    /// Replace the stored value only if `candidate` is strictly higher.
    ///
    /// Returns the previous value when the record changed.
    pub fn raise(
        &mut self,
        key: &str,
        candidate: WatchPercent,
    ) -> Option<WatchPercent> {
        let previous = self.percent(key);
        if candidate <= previous {
            return None;
        }
        self.set_percent(key, candidate);
        Some(previous)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, WatchPercent)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// All file entries as text, in key order, including unparsable ones.
    pub(crate) fn raw_pairs(&self) -> Vec<(&str, String)> {
        let mut pairs: Vec<(&str, String)> = self
            .entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.value().to_string()))
            .chain(self.unparsed.iter().map(|(k, v)| (k.as_str(), v.clone())))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs
    }

    pub fn len(&self) -> usize {
        self.entries.len() + self.unparsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.all_viewed.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparsable_values_read_as_zero_but_survive() {
        let mut record = WatchRecord::new();
        record.apply_raw("a.mkv".into(), "half".into());
        record.apply_raw("b.mkv".into(), "30".into());

        assert_eq!(record.percent("a.mkv"), WatchPercent::ZERO);
        assert_eq!(record.percent("b.mkv").value(), 30);
        assert_eq!(record.len(), 2);
        assert!(record.raw_pairs().contains(&("a.mkv", "half".to_string())));
    }

    #[test]
    fn stored_values_are_clamped_on_load() {
        let mut record = WatchRecord::new();
        record.apply_raw("a.mkv".into(), "140".into());
        record.apply_raw("b.mkv".into(), "-2".into());
        assert_eq!(record.percent("a.mkv"), WatchPercent::FULL);
        assert_eq!(record.percent("b.mkv"), WatchPercent::ZERO);
    }

    #[test]
    fn all_viewed_requires_literal_true() {
        let mut record = WatchRecord::new();
        record.apply_raw(ALL_VIEWED_KEY.into(), "yes".into());
        assert!(!record.all_viewed());
        record.apply_raw(ALL_VIEWED_KEY.into(), "true".into());
        assert!(record.all_viewed());
        assert_eq!(record.percent(ALL_VIEWED_KEY), WatchPercent::ZERO);
    }

    #[test]
    fn raise_is_monotonic() {
        let mut record = WatchRecord::new();
        assert_eq!(
            record.raise("a.mkv", WatchPercent::clamped(40)),
            Some(WatchPercent::ZERO)
        );
        assert_eq!(record.raise("a.mkv", WatchPercent::clamped(40)), None);
        assert_eq!(record.raise("a.mkv", WatchPercent::clamped(10)), None);
        assert_eq!(record.percent("a.mkv").value(), 40);
    }

    #[test]
    fn raise_replaces_unparsable_value() {
        let mut record = WatchRecord::new();
        record.apply_raw("a.mkv".into(), "??".into());
        record.raise("a.mkv", WatchPercent::clamped(5));
        assert_eq!(record.raw_pairs(), vec![("a.mkv", "5".to_string())]);
    }
}
