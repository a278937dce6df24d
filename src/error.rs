use thiserror::Error;

use crate::presenter::ExportTarget;
use crate::slots::SlotRole;

/// One or more image slots were empty when a submission was attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing images: {}", format_roles(.missing))]
pub struct IncompleteInputError {
    pub missing: Vec<SlotRole>,
}

impl IncompleteInputError {
    pub fn user_message(&self) -> &'static str {
        "Please upload all three pose images."
    }
}

fn format_roles(roles: &[SlotRole]) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The inference service could not produce a usable result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteServiceError {
    #[error("Failed to get measurements (HTTP {0})")]
    Status(u16),

    #[error("Malformed measurement payload: {0}")]
    MalformedPayload(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl RemoteServiceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            RemoteServiceError::Status(_) => "Failed to get measurements",
            RemoteServiceError::MalformedPayload(_) | RemoteServiceError::Network(_) => {
                "Failed to process images. Please try again."
            }
        }
    }
}

impl From<reqwest::Error> for RemoteServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteServiceError::MalformedPayload(err.to_string())
        } else {
            RemoteServiceError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    IncompleteInput(#[from] IncompleteInputError),

    #[error("Invalid height: {0:?}")]
    InvalidHeight(String),

    #[error("A submission is already in flight for this session")]
    AlreadyInFlight,

    #[error(transparent)]
    RemoteService(#[from] RemoteServiceError),
}

impl SubmissionError {
    /// Text suitable for a toast or inline validation message.
    pub fn user_message(&self) -> &'static str {
        match self {
            SubmissionError::IncompleteInput(e) => e.user_message(),
            SubmissionError::InvalidHeight(_) => "Please enter a valid height in centimeters.",
            SubmissionError::AlreadyInFlight => "Measurements are already being processed.",
            SubmissionError::RemoteService(e) => e.user_message(),
        }
    }
}

/// Durable read/write failure in the history store. Never surfaced to the
/// user as a blocking error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("Failed to read history: {0}")]
    Read(String),

    #[error("Failed to write history: {0}")]
    Write(String),

    #[error("Stored history is corrupt: {0}")]
    Corrupt(String),
}

/// An export path (rasterize, share sheet, clipboard) is unavailable or failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{target} export unavailable: {reason}")]
pub struct UnsupportedExportError {
    pub target: ExportTarget,
    pub reason: String,
    pub fallback: Option<ExportTarget>,
}

impl UnsupportedExportError {
    pub fn new(target: ExportTarget, reason: impl Into<String>) -> Self {
        Self {
            target,
            reason: reason.into(),
            fallback: target.fallback(),
        }
    }

    pub fn user_message(&self) -> String {
        match self.fallback {
            Some(ExportTarget::Clipboard) => {
                "Sharing isn't available here. Try copying the image instead.".to_string()
            }
            Some(ExportTarget::Download) => {
                "Couldn't share the image. Try downloading instead.".to_string()
            }
            Some(ExportTarget::Share) | None => {
                format!("Couldn't export the image: {}", self.reason)
            }
        }
    }
}
