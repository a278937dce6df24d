//! Bounded, persisted log of past measurement results.

mod compare;
mod storage;
mod store;
mod types;

pub use compare::{
    changes_between, classify_change, Change, ChangeDirection, MeasurementChange, CHANGE_EPSILON,
};
pub use storage::{HistoryStorage, JsonFileStorage, MemoryStorage, SqliteStorage, HISTORY_SLOT};
pub use store::HistoryStore;
pub use types::{HistoryEntry, HistoryLog, MAX_HISTORY_ENTRIES};
