//! Client-side session lifecycle for three-photo body measurement:
//! collect front, side and standing images, submit them to the inference
//! service, keep a bounded history of results, and render a shareable card.

pub mod config;
pub mod error;
pub mod history;
pub mod measurement;
pub mod presenter;
pub mod slots;
pub mod submission;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use config::{HistoryBackend, HistoryConfig, MeasureConfig};
pub use error::{
    IncompleteInputError, PersistenceError, RemoteServiceError, SubmissionError,
    UnsupportedExportError,
};
pub use history::{HistoryEntry, HistoryLog, HistoryStore};
pub use measurement::{MeasurementKey, MeasurementResult};
pub use presenter::{
    build_shareable_artifact, normalize, ExportTarget, MeasurementRow, RenderableDocument,
};
pub use slots::{CandidateFile, ImageSlots, SlotRole};
pub use submission::{
    HeightPolicy, HttpMeasurementClient, Session, SharedSession, SubmissionController,
};

/// Install the fmt subscriber, filtered by `RUST_LOG` (default `info`).
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

/// Lock, taking over a poisoned mutex instead of propagating the panic.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
