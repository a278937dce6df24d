use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::compare::{changes_between, MeasurementChange};
use crate::measurement::{MeasurementKey, MeasurementResult};

/// Maximum number of entries kept in the history log.
pub const MAX_HISTORY_ENTRIES: usize = 10;

/// One recorded measurement. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    id: String,
    date: DateTime<Utc>,
    results: MeasurementResult,
}

impl HistoryEntry {
    /// New entry with a fresh UUID, stamped now.
    pub fn new(results: MeasurementResult) -> Self {
        Self::recorded_at(Utc::now(), results)
    }

    pub fn recorded_at(date: DateTime<Utc>, results: MeasurementResult) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            results,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn results(&self) -> &MeasurementResult {
        &self.results
    }

    /// Capture time in local time, e.g. "Mar 4, 2026 at 9:05 AM".
    pub fn display_date(&self) -> String {
        self.display_date_in(&Local)
    }

    pub fn display_date_in<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        self.date
            .with_timezone(tz)
            .format("%b %-d, %Y at %-I:%M %p")
            .to_string()
    }

    /// Compact line for list views: the first three measurements.
    pub fn summary(&self) -> String {
        MeasurementKey::ALL
            .iter()
            .take(3)
            .map(|key| match self.results.get(*key) {
                Some(v) => format!("{}: {:.1}cm", key.short_label(), v),
                None => format!("{}: —", key.short_label()),
            })
            .collect::<Vec<_>>()
            .join("  ")
    }
}

/// Past results, most recent first, never longer than [`MAX_HISTORY_ENTRIES`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    /// The entry recorded just before the latest one.
    pub fn previous(&self) -> Option<&HistoryEntry> {
        self.entries.get(1)
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Per-key change of the latest entry against the previous one.
    /// Empty when fewer than two entries exist.
    pub fn changes_from_previous(&self) -> Vec<MeasurementChange> {
        match (self.latest(), self.previous()) {
            (Some(latest), Some(previous)) => changes_between(&latest.results, &previous.results),
            _ => Vec::new(),
        }
    }

    /// "1 record", "4 records".
    pub fn record_count_label(&self) -> String {
        match self.entries.len() {
            1 => "1 record".to_string(),
            n => format!("{} records", n),
        }
    }

    /// Insert at the head, evicting from the tail past the maximum.
    pub(crate) fn push_front(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_HISTORY_ENTRIES);
    }

    /// Returns whether an entry was removed.
    pub(crate) fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Enforce the length bound on logs read back from storage.
    pub(crate) fn truncate_to_max(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.truncate(MAX_HISTORY_ENTRIES);
        before - self.entries.len()
    }
}
