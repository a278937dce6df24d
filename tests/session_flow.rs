use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bodymeasure::error::RemoteServiceError;
use bodymeasure::history::{ChangeDirection, MemoryStorage};
use bodymeasure::submission::{MeasurementRequest, MeasurementService};
use bodymeasure::{
    build_shareable_artifact, CandidateFile, HistoryStore, MeasurementKey, MeasurementResult,
    Session, SharedSession, SlotRole, SubmissionController, SubmissionError,
};

const CANONICAL: &str = r#"{"Estimated Height (cm)":170.2,"Shoulder (cm)":45.0,"Hip (cm)":95.3,"Arm Length (cm)":60.1,"Leg / Inseam (cm)":80.0}"#;

/// Answers every request by parsing a fixed response body.
struct CannedService {
    body: String,
    calls: AtomicUsize,
}

impl CannedService {
    fn new(body: &str) -> Self {
        Self {
            body: body.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl MeasurementService for CannedService {
    async fn measure(
        &self,
        _request: MeasurementRequest,
    ) -> Result<MeasurementResult, RemoteServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        MeasurementResult::from_response_body(self.body.as_bytes())
    }
}

fn jpeg(name: &str) -> CandidateFile {
    CandidateFile::new(name, "image/jpeg", vec![0xFFu8, 0xD8, 0xFF, 0xE0])
}

/// Fill every slot the way a host would: select, then run the preview job.
async fn fill_all(session: &SharedSession) {
    for role in SlotRole::ALL {
        let job = session
            .lock()
            .unwrap()
            .slots_mut()
            .select(role, jpeg(&format!("{}.jpg", role)))
            .expect("jpeg is accepted");
        let ready = job.run().await.expect("preview renders");
        assert!(session.lock().unwrap().slots_mut().apply_preview(ready));
    }
}

#[tokio::test]
async fn test_full_session_lifecycle() {
    let history = Arc::new(HistoryStore::open(MemoryStorage::new()));
    let controller = SubmissionController::new(CannedService::new(CANONICAL), history.clone());
    let session = Session::shared();

    fill_all(&session).await;
    {
        let state = session.lock().unwrap();
        assert!(state.slots().is_complete());
        for slot in state.slots().iter() {
            let preview = slot.preview().expect("preview applied");
            assert!(preview.starts_with("data:image/jpeg;base64,"));
        }
    }

    let result = controller.submit(&session).await.unwrap();
    assert_eq!(result, MeasurementResult::from_response_body(CANONICAL.as_bytes()).unwrap());

    let rows = session.lock().unwrap().result_rows();
    let labels: Vec<_> = rows.iter().map(|r| r.label).collect();
    assert_eq!(labels, vec!["Height", "Shoulder", "Hip", "Arm Length", "Leg/Inseam"]);
    assert_eq!(rows[0].value, Some(170.2));
    assert_eq!(rows[4].formatted_value().as_deref(), Some("80.0"));

    let log = history.snapshot();
    assert_eq!(log.len(), 1);
    assert_eq!(log.latest().unwrap().results(), &result);
    assert!(log.changes_from_previous().is_empty());

    let card = build_shareable_artifact(&result);
    let svg = card.to_svg();
    assert!(svg.contains("170.2"));
    assert!(svg.contains("Leg/Inseam"));

    session.lock().unwrap().reset();
    let state = session.lock().unwrap();
    assert_eq!(state.slots().missing_roles(), SlotRole::ALL.to_vec());
    assert!(state.result().is_none());
    assert!(state.slots().iter().all(|s| s.preview().is_none()));
}

#[tokio::test]
async fn test_incomplete_session_never_reaches_service() {
    let history = Arc::new(HistoryStore::open(MemoryStorage::new()));
    let controller = SubmissionController::new(CannedService::new(CANONICAL), history.clone());
    let session = Session::shared();
    session
        .lock()
        .unwrap()
        .slots_mut()
        .select(SlotRole::Front, jpeg("front.jpg"));

    let err = controller.submit(&session).await.unwrap_err();
    match &err {
        SubmissionError::IncompleteInput(e) => {
            assert_eq!(e.missing, vec![SlotRole::Side, SlotRole::Standing])
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.user_message(), "Please upload all three pose images.");
    assert!(history.snapshot().is_empty());
    assert!(!session.lock().unwrap().is_loading());
}

#[test]
fn test_rejected_and_replaced_files() {
    let session = Session::shared();
    let mut state = session.lock().unwrap();
    let slots = state.slots_mut();

    assert!(slots
        .select(SlotRole::Side, CandidateFile::new("notes.pdf", "application/pdf", vec![1u8]))
        .is_none());
    assert!(!slots.slot(SlotRole::Side).is_filled());

    slots.select(SlotRole::Side, jpeg("first.jpg"));
    let stale = slots.slot(SlotRole::Side).generation();
    let job = slots.select(SlotRole::Side, jpeg("second.jpg")).unwrap();
    assert_ne!(job.generation(), stale);
    assert_eq!(slots.file(SlotRole::Side).unwrap().name, "second.jpg");
}

#[tokio::test]
async fn test_repeat_measurements_show_changes() {
    let history = Arc::new(HistoryStore::open(MemoryStorage::new()));
    let session = Session::shared();
    fill_all(&session).await;

    SubmissionController::new(CannedService::new(CANONICAL), history.clone())
        .submit(&session)
        .await
        .unwrap();

    let later = r#"{"Estimated Height (cm)":170.25,"Shoulder (cm)":46.2,"Hip (cm)":94.5,"Arm Length (cm)":60.1}"#;
    SubmissionController::new(CannedService::new(later), history.clone())
        .submit(&session)
        .await
        .unwrap();

    let log = history.snapshot();
    assert_eq!(log.len(), 2);
    assert_eq!(log.record_count_label(), "2 records");

    let changes = log.changes_from_previous();
    let by_key = |key: MeasurementKey| changes.iter().find(|c| c.key == key).map(|c| c.change);

    assert_eq!(by_key(MeasurementKey::Height).unwrap().direction, ChangeDirection::Negligible);
    let shoulder = by_key(MeasurementKey::Shoulder).unwrap();
    assert_eq!(shoulder.direction, ChangeDirection::Increase);
    assert_eq!(shoulder.display(), "+1.2");
    assert_eq!(by_key(MeasurementKey::Hip).unwrap().display(), "-0.8");
    // Leg/Inseam is missing from the later result.
    assert!(by_key(MeasurementKey::LegInseam).is_none());

    // Session shows only the newest result.
    let rows = session.lock().unwrap().result_rows();
    assert_eq!(rows[4].value, None);
    assert_eq!(rows[4].formatted_value(), None);
}

#[tokio::test]
async fn test_malformed_response_surfaces_as_failure() {
    let history = Arc::new(HistoryStore::open(MemoryStorage::new()));
    let service = CannedService::new(r#"{"detail":"no person found"}"#);
    let controller = SubmissionController::new(service, history.clone());
    let session = Session::shared();
    fill_all(&session).await;

    let err = controller.submit(&session).await.unwrap_err();
    assert!(matches!(
        err,
        SubmissionError::RemoteService(RemoteServiceError::MalformedPayload(_))
    ));
    assert_eq!(err.user_message(), "Failed to process images. Please try again.");
    assert!(history.snapshot().is_empty());
    assert!(session.lock().unwrap().result().is_none());
}
