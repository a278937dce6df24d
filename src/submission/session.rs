use std::sync::{Arc, Mutex};

use crate::measurement::MeasurementResult;
use crate::presenter::{normalize, MeasurementRow};
use crate::slots::ImageSlots;

/// Session state shared between UI callbacks and the submission controller.
/// The lock is never held across an `.await`.
pub type SharedSession = Arc<Mutex<Session>>;

/// Transient state of one measurement attempt. Not persisted.
#[derive(Debug, Default)]
pub struct Session {
    slots: ImageSlots,
    height_input: String,
    loading: bool,
    result: Option<MeasurementResult>,
    /// Bumped by `reset`, so a response for an abandoned attempt is not
    /// written into the fresh session.
    epoch: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedSession {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn slots(&self) -> &ImageSlots {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut ImageSlots {
        &mut self.slots
    }

    /// Raw text of the height field, in centimeters.
    pub fn height_input(&self) -> &str {
        &self.height_input
    }

    pub fn set_height_input(&mut self, input: impl Into<String>) {
        self.height_input = input.into();
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn result(&self) -> Option<&MeasurementResult> {
        self.result.as_ref()
    }

    /// Display rows for the current result; empty when there is none.
    pub fn result_rows(&self) -> Vec<MeasurementRow> {
        self.result.as_ref().map(normalize).unwrap_or_default()
    }

    /// Start over: empty slots, no height, no result.
    ///
    /// A submission already in flight keeps running, but its result is no
    /// longer applied to this session.
    pub fn reset(&mut self) {
        self.slots.reset();
        self.height_input.clear();
        self.result = None;
        self.epoch += 1;
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn begin_submission(&mut self) {
        self.loading = true;
        self.result = None;
    }

    pub(crate) fn end_submission(&mut self) {
        self.loading = false;
    }

    /// Store a result for the attempt started at `epoch`. Returns false if
    /// the session was reset in the meantime.
    pub(crate) fn complete(&mut self, epoch: u64, result: MeasurementResult) -> bool {
        if self.epoch != epoch {
            return false;
        }
        self.result = Some(result);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::MeasurementKey;
    use crate::slots::{CandidateFile, SlotRole};

    #[test]
    fn test_begin_clears_previous_result() {
        let mut session = Session::new();
        let epoch = session.epoch();
        session.begin_submission();
        let result = MeasurementResult::default().with(MeasurementKey::Hip, 90.0);
        assert!(session.complete(epoch, result));
        session.end_submission();
        assert!(session.result().is_some());

        session.begin_submission();
        assert!(session.is_loading());
        assert!(session.result().is_none());
    }

    #[test]
    fn test_result_rows() {
        let mut session = Session::new();
        assert!(session.result_rows().is_empty());
        let epoch = session.epoch();
        session.complete(epoch, MeasurementResult::default().with(MeasurementKey::Height, 170.2));
        let rows = session.result_rows();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].value, Some(170.2));
    }

    #[test]
    fn test_reset_discards_late_result() {
        let mut session = Session::new();
        session
            .slots_mut()
            .select(SlotRole::Front, CandidateFile::new("f.jpg", "image/jpeg", vec![1u8]));
        session.set_height_input("175");
        let epoch = session.epoch();
        session.begin_submission();

        session.reset();
        assert!(session.slots().missing_roles().len() == 3);
        assert_eq!(session.height_input(), "");
        let late = MeasurementResult::default().with(MeasurementKey::Hip, 1.0);
        assert!(!session.complete(epoch, late));
        assert!(session.result().is_none());
    }
}
