use std::sync::Arc;

use tracing::{debug, info, warn};

use super::client::{MeasurementRequest, MeasurementService};
use super::session::{Session, SharedSession};
use crate::error::{IncompleteInputError, SubmissionError};
use crate::history::HistoryStore;
use crate::lock_unpoisoned;
use crate::measurement::MeasurementResult;
use crate::slots::SlotRole;

/// Whether a user-entered height travels with the request.
///
/// The two modes are different service contracts, so exactly one is active
/// per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeightPolicy {
    /// Never send a height.
    #[default]
    Omit,
    /// Require a positive height and send it as `height_cm`.
    Required,
}

/// Drives one submission at a time per session: validate, send, record.
pub struct SubmissionController<S> {
    service: S,
    history: Arc<HistoryStore>,
    height_policy: HeightPolicy,
}

impl<S: MeasurementService> SubmissionController<S> {
    pub fn new(service: S, history: Arc<HistoryStore>) -> Self {
        Self {
            service,
            history,
            height_policy: HeightPolicy::default(),
        }
    }

    pub fn with_height_policy(mut self, policy: HeightPolicy) -> Self {
        self.height_policy = policy;
        self
    }

    pub fn height_policy(&self) -> HeightPolicy {
        self.height_policy
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Submit the session's three images.
    ///
    /// Input is validated before any I/O. While the request is pending the
    /// session reports `is_loading()` and other callbacks may keep using it.
    /// On success the result is stored in the session and recorded in
    /// history; a history write failure is logged, never returned.
    pub async fn submit(
        &self,
        session: &SharedSession,
    ) -> Result<MeasurementResult, SubmissionError> {
        let (request, epoch) = {
            let mut state = lock_unpoisoned(session);
            if state.is_loading() {
                warn!("Ignoring submit: a submission is already in flight");
                return Err(SubmissionError::AlreadyInFlight);
            }
            let request = self.prepare(&state)?;
            state.begin_submission();
            (request, state.epoch())
        };

        let in_flight = InFlight::new(session);
        let outcome = self.service.measure(request).await;

        match outcome {
            Ok(result) => {
                let kept = in_flight.finish(|state| state.complete(epoch, result));
                if !kept {
                    info!("Session was reset during submission; result not applied to it");
                }
                let log = self.history.record(result).await;
                info!("Measurements ready; history now holds {} entries", log.len());
                Ok(result)
            }
            Err(e) => {
                in_flight.finish(|_| ());
                warn!("Measurement request failed: {}", e);
                Err(e.into())
            }
        }
    }

    fn prepare(&self, session: &Session) -> Result<MeasurementRequest, SubmissionError> {
        let slots = session.slots();
        let missing = slots.missing_roles();
        if !missing.is_empty() {
            debug!("Submit blocked, missing: {:?}", missing);
            return Err(IncompleteInputError { missing }.into());
        }

        let height_cm = match self.height_policy {
            HeightPolicy::Omit => None,
            HeightPolicy::Required => {
                let input = session.height_input();
                let height = parse_height(input)
                    .ok_or_else(|| SubmissionError::InvalidHeight(input.to_string()))?;
                Some(height)
            }
        };

        let file = |role: SlotRole| {
            slots
                .file(role)
                .cloned()
                .ok_or_else(|| SubmissionError::from(IncompleteInputError { missing: vec![role] }))
        };

        Ok(MeasurementRequest {
            front: file(SlotRole::Front)?,
            side: file(SlotRole::Side)?,
            standing: file(SlotRole::Standing)?,
            height_cm,
        })
    }
}

/// Positive, finite centimeters; anything else is rejected.
pub fn parse_height(input: &str) -> Option<f64> {
    let value: f64 = input.trim().parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Clears the session's loading flag when the submission ends, including
/// when the submit future is dropped mid-request.
struct InFlight<'a> {
    session: &'a SharedSession,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(session: &'a SharedSession) -> Self {
        Self { session, armed: true }
    }

    /// End the submission and apply `f` under the same lock.
    fn finish<R>(mut self, f: impl FnOnce(&mut Session) -> R) -> R {
        self.armed = false;
        let session = self.session;
        let mut state = lock_unpoisoned(session);
        state.end_submission();
        f(&mut state)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!("Submission abandoned before completion");
            lock_unpoisoned(self.session).end_submission();
        }
    }
}
