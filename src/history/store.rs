use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use super::storage::HistoryStorage;
use super::types::{HistoryEntry, HistoryLog};
use crate::error::PersistenceError;
use crate::lock_unpoisoned;
use crate::measurement::MeasurementResult;

/// The bounded measurement history, shared by handle (`Arc<HistoryStore>`).
///
/// All mutation goes through `add`, `record`, `delete` and `clear`. Each one
/// updates the in-memory log first and then rewrites the durable slot.
/// Persistence is best-effort: a failed write is logged and remembered, but
/// the in-memory update stands.
///
/// Every mutation gets a revision number. A write for a revision older than
/// the last one written is skipped, so the durable slot never goes backwards
/// even when writes run on the blocking pool.
pub struct HistoryStore {
    storage: Box<dyn HistoryStorage>,
    state: Mutex<LogState>,
    /// Revision of the last payload handed to storage.
    written: Mutex<u64>,
    last_error: Mutex<Option<PersistenceError>>,
}

#[derive(Default)]
struct LogState {
    log: HistoryLog,
    revision: u64,
}

impl HistoryStore {
    /// Store over `storage` with an empty in-memory log. Call [`load`] to
    /// pick up what is already persisted, or use [`HistoryStore::open`].
    ///
    /// [`load`]: HistoryStore::load
    pub fn new(storage: impl HistoryStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            state: Mutex::new(LogState::default()),
            written: Mutex::new(0),
            last_error: Mutex::new(None),
        }
    }

    /// Create the store and load the persisted log.
    pub fn open(storage: impl HistoryStorage + 'static) -> Self {
        let store = Self::new(storage);
        store.load();
        store
    }

    /// Read durable storage into memory.
    ///
    /// Absent, unreadable or corrupt storage yields an empty log; the cause is
    /// logged and kept for [`take_persistence_error`], never returned.
    ///
    /// [`take_persistence_error`]: HistoryStore::take_persistence_error
    pub fn load(&self) -> HistoryLog {
        let loaded = match self.read_log() {
            Ok(log) => log,
            Err(e) => {
                warn!(
                    "Failed to load measurement history from {}: {}. Starting empty.",
                    self.storage.describe(),
                    e
                );
                self.remember(e);
                HistoryLog::new()
            }
        };

        let mut state = lock_unpoisoned(&self.state);
        state.log = loaded;
        info!("Loaded {} history entries", state.log.len());
        state.log.clone()
    }

    fn read_log(&self) -> Result<HistoryLog, PersistenceError> {
        let Some(payload) = self.storage.read()? else {
            debug!("No stored history at {}", self.storage.describe());
            return Ok(HistoryLog::new());
        };

        let mut log: HistoryLog =
            serde_json::from_str(&payload).map_err(|e| PersistenceError::Corrupt(e.to_string()))?;
        let dropped = log.truncate_to_max();
        if dropped > 0 {
            warn!("Stored history exceeded the limit; dropped {} oldest entries", dropped);
        }
        Ok(log)
    }

    /// Current in-memory log.
    pub fn snapshot(&self) -> HistoryLog {
        lock_unpoisoned(&self.state).log.clone()
    }

    /// Record `result` as the newest entry, evicting the oldest past the limit.
    /// The durable write happens on the calling thread.
    pub fn add(&self, result: MeasurementResult) -> HistoryLog {
        let entry = HistoryEntry::new(result);
        info!("Adding history entry {}", entry.id());
        self.mutate(|log| log.push_front(entry))
    }

    /// Like [`add`], for async callers: the in-memory prepend is immediate and
    /// the durable write runs on tokio's blocking pool. Must be called from
    /// within a tokio runtime.
    ///
    /// [`add`]: HistoryStore::add
    pub async fn record(self: &Arc<Self>, result: MeasurementResult) -> HistoryLog {
        let entry = HistoryEntry::new(result);
        info!("Recording history entry {}", entry.id());
        let (revision, log) = self.apply(|log| log.push_front(entry));

        let store = Arc::clone(self);
        let snapshot = log.clone();
        let write = tokio::task::spawn_blocking(move || store.write_revision(revision, &snapshot));
        if let Err(e) = write.await {
            warn!("History write task did not complete: {}", e);
        }
        log
    }

    /// Remove the entry with `id`. An unknown id leaves the log as it was.
    pub fn delete(&self, id: &str) -> HistoryLog {
        self.mutate(|log| {
            if log.remove(id) {
                info!("Deleted history entry {}", id);
            } else {
                debug!("No history entry {} to delete", id);
            }
        })
    }

    pub fn clear(&self) -> HistoryLog {
        info!("Clearing measurement history");
        self.mutate(HistoryLog::clear)
    }

    /// The most recent persistence failure since the last call, if any.
    pub fn take_persistence_error(&self) -> Option<PersistenceError> {
        lock_unpoisoned(&self.last_error).take()
    }

    fn mutate(&self, f: impl FnOnce(&mut HistoryLog)) -> HistoryLog {
        let (revision, log) = self.apply(f);
        self.write_revision(revision, &log);
        log
    }

    /// Apply `f` in memory and stamp the result with the next revision.
    fn apply(&self, f: impl FnOnce(&mut HistoryLog)) -> (u64, HistoryLog) {
        let mut state = lock_unpoisoned(&self.state);
        f(&mut state.log);
        state.revision += 1;
        (state.revision, state.log.clone())
    }

    fn write_revision(&self, revision: u64, log: &HistoryLog) {
        let mut written = lock_unpoisoned(&self.written);
        if revision <= *written {
            debug!("Skipping history revision {}; {} already written", revision, *written);
            return;
        }
        *written = revision;
        if let Err(e) = self.persist(log) {
            warn!(
                "Failed to persist measurement history to {}: {}. Keeping in-memory state.",
                self.storage.describe(),
                e
            );
            self.remember(e);
        }
    }

    fn persist(&self, log: &HistoryLog) -> Result<(), PersistenceError> {
        let payload =
            serde_json::to_string(log).map_err(|e| PersistenceError::Write(e.to_string()))?;
        self.storage.write(&payload)
    }

    fn remember(&self, err: PersistenceError) {
        *lock_unpoisoned(&self.last_error) = Some(err);
    }
}
