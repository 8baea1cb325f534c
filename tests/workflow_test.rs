//! Upload workflow state machine tests, driven through a scripted
//! in-memory backend so no network is involved.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use debris_detect_common::{
    parse_detections, DetectError, Detection, DetectionBackend, Result, UploadWorkflow,
    WorkflowEvent,
};

const ANNOTATED: &[u8] = b"annotated-jpeg-bytes";

struct FakeBackend {
    upload_calls: Arc<AtomicUsize>,
    detection_calls: Arc<AtomicUsize>,
    fail_upload: bool,
    fail_detections: bool,
    detections: Vec<Detection>,
    // When present, upload blocks until the sender side is dropped or
    // signalled, letting tests observe the mid-run state.
    gate: Arc<Mutex<Option<Receiver<()>>>>,
}

impl FakeBackend {
    fn new(detections: Vec<Detection>) -> Self {
        Self {
            upload_calls: Arc::new(AtomicUsize::new(0)),
            detection_calls: Arc::new(AtomicUsize::new(0)),
            fail_upload: false,
            fail_detections: false,
            detections,
            gate: Arc::new(Mutex::new(None)),
        }
    }

    fn counters(&self) -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        (
            Arc::clone(&self.upload_calls),
            Arc::clone(&self.detection_calls),
        )
    }

    fn gated(self) -> (Self, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        *self.gate.lock().unwrap() = Some(rx);
        (self, tx)
    }

    fn gate_handle(&self) -> Arc<Mutex<Option<Receiver<()>>>> {
        Arc::clone(&self.gate)
    }
}

impl DetectionBackend for FakeBackend {
    fn upload(&self, _file_name: &str, _bytes: Vec<u8>) -> Result<Vec<u8>> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(rx) = self.gate.lock().unwrap().take() {
            let _ = rx.recv();
        }
        if self.fail_upload {
            return Err(DetectError::Backend(500));
        }
        Ok(ANNOTATED.to_vec())
    }

    fn detections(&self) -> Result<Vec<Detection>> {
        self.detection_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_detections {
            return Err(DetectError::Backend(502));
        }
        Ok(self.detections.clone())
    }
}

fn sample_detections() -> Vec<Detection> {
    vec![
        Detection {
            class: "bottle".to_string(),
            confidence: 0.932,
        },
        Detection {
            class: "bag".to_string(),
            confidence: 0.47,
        },
    ]
}

fn wait_for_event(workflow: &mut UploadWorkflow<FakeBackend>) -> WorkflowEvent {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(event) = workflow.poll() {
            return event;
        }
        assert!(Instant::now() < deadline, "workflow never completed");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn successful_run_installs_image_and_detections_together() {
    let backend = FakeBackend::new(sample_detections());
    let (uploads, fetches) = backend.counters();
    let mut workflow = UploadWorkflow::new(backend);

    workflow.select_image("debris.jpg", vec![1, 2, 3]);
    workflow.start().unwrap();
    let event = wait_for_event(&mut workflow);

    assert!(matches!(event, WorkflowEvent::Completed));
    let snapshot = workflow.snapshot();
    assert_eq!(snapshot.annotated, Some(ANNOTATED));
    assert_eq!(snapshot.detections.len(), 2);
    assert_eq!(snapshot.detections[0].class, "bottle");
    assert_eq!(snapshot.detections[1].class, "bag");
    assert!(!snapshot.busy);
    assert_eq!(uploads.load(Ordering::SeqCst), 1);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[test]
fn start_without_image_performs_no_network_calls() {
    let backend = FakeBackend::new(sample_detections());
    let (uploads, fetches) = backend.counters();
    let mut workflow = UploadWorkflow::new(backend);

    let result = workflow.start();

    assert!(matches!(result, Err(DetectError::NoImageSelected)));
    assert!(!workflow.snapshot().busy);
    assert_eq!(uploads.load(Ordering::SeqCst), 0);
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
}

#[test]
fn upload_failure_leaves_results_empty_and_returns_to_idle() {
    let mut backend = FakeBackend::new(sample_detections());
    backend.fail_upload = true;
    let (uploads, fetches) = backend.counters();
    let mut workflow = UploadWorkflow::new(backend);

    workflow.select_image("debris.jpg", vec![1, 2, 3]);
    workflow.start().unwrap();
    let event = wait_for_event(&mut workflow);

    assert!(matches!(
        event,
        WorkflowEvent::Failed(DetectError::Backend(500))
    ));
    let snapshot = workflow.snapshot();
    assert!(snapshot.annotated.is_none());
    assert!(snapshot.detections.is_empty());
    assert!(!snapshot.busy);
    assert_eq!(uploads.load(Ordering::SeqCst), 1);
    // The run stops at the first failed step.
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
}

#[test]
fn detections_failure_discards_the_uploaded_result() {
    let mut backend = FakeBackend::new(sample_detections());
    backend.fail_detections = true;
    let mut workflow = UploadWorkflow::new(backend);

    workflow.select_image("debris.jpg", vec![1, 2, 3]);
    workflow.start().unwrap();
    let event = wait_for_event(&mut workflow);

    assert!(matches!(
        event,
        WorkflowEvent::Failed(DetectError::Backend(502))
    ));
    // The annotated image from the successful upload step is rolled
    // back so it is never displayed without its detection list.
    let snapshot = workflow.snapshot();
    assert!(snapshot.annotated.is_none());
    assert!(snapshot.detections.is_empty());
    assert!(!snapshot.busy);
}

#[test]
fn detections_list_preserves_order_and_percent_format() {
    let body = r#"[{"class":"bottle","confidence":0.932},{"class":"bag","confidence":0.47}]"#;
    let detections = parse_detections(body).unwrap();

    let rendered: Vec<(String, String)> = detections
        .iter()
        .map(|d| (d.class.clone(), d.confidence_percent()))
        .collect();
    assert_eq!(
        rendered,
        vec![
            ("bottle".to_string(), "93.2%".to_string()),
            ("bag".to_string(), "47.0%".to_string()),
        ]
    );
}

#[test]
fn selecting_a_new_image_keeps_prior_results_until_next_run() {
    let backend = FakeBackend::new(sample_detections());
    let mut workflow = UploadWorkflow::new(backend);

    workflow.select_image("first.jpg", vec![1]);
    workflow.start().unwrap();
    wait_for_event(&mut workflow);

    workflow.select_image("second.jpg", vec![2]);

    let snapshot = workflow.snapshot();
    assert_eq!(snapshot.annotated, Some(ANNOTATED));
    assert_eq!(snapshot.detections.len(), 2);
    assert_eq!(snapshot.selected.unwrap().file_name, "second.jpg");
}

#[test]
fn starting_a_run_clears_prior_results_together() {
    let backend = FakeBackend::new(sample_detections());
    let gate = backend.gate_handle();
    let mut workflow = UploadWorkflow::new(backend);

    workflow.select_image("debris.jpg", vec![1]);
    workflow.start().unwrap();
    wait_for_event(&mut workflow);
    assert!(workflow.snapshot().annotated.is_some());

    // Second run, held open at the upload step.
    let (release, rx) = mpsc::channel();
    *gate.lock().unwrap() = Some(rx);
    workflow.start().unwrap();

    // The previous image and detections are gone while the run is
    // still in flight.
    let snapshot = workflow.snapshot();
    assert!(snapshot.busy);
    assert!(snapshot.annotated.is_none());
    assert!(snapshot.detections.is_empty());

    release.send(()).unwrap();
    let event = wait_for_event(&mut workflow);
    assert!(matches!(event, WorkflowEvent::Completed));
}

#[test]
fn busy_only_between_start_and_completion() {
    let backend = FakeBackend::new(Vec::new());
    let mut workflow = UploadWorkflow::new(backend);
    assert!(!workflow.snapshot().busy);

    workflow.select_image("debris.jpg", vec![1]);
    workflow.start().unwrap();
    assert!(workflow.snapshot().busy);

    wait_for_event(&mut workflow);
    assert!(!workflow.snapshot().busy);
}

#[test]
fn second_start_while_analyzing_is_rejected() {
    let (backend, release) = FakeBackend::new(sample_detections()).gated();
    let (uploads, _) = backend.counters();
    let mut workflow = UploadWorkflow::new(backend);

    workflow.select_image("debris.jpg", vec![1]);
    workflow.start().unwrap();

    // Let the worker reach the upload call before probing.
    let deadline = Instant::now() + Duration::from_secs(5);
    while uploads.load(Ordering::SeqCst) == 0 {
        assert!(Instant::now() < deadline, "worker never started");
        std::thread::sleep(Duration::from_millis(5));
    }

    let second = workflow.start();
    assert!(matches!(second, Err(DetectError::AnalysisInProgress)));
    assert_eq!(uploads.load(Ordering::SeqCst), 1);

    release.send(()).unwrap();
    wait_for_event(&mut workflow);

    // Back to idle, a new run is accepted again.
    workflow.start().unwrap();
    wait_for_event(&mut workflow);
    assert_eq!(uploads.load(Ordering::SeqCst), 2);
}

#[test]
fn empty_detections_response_is_a_valid_result() {
    let backend = FakeBackend::new(Vec::new());
    let mut workflow = UploadWorkflow::new(backend);

    workflow.select_image("debris.jpg", vec![1]);
    workflow.start().unwrap();
    let event = wait_for_event(&mut workflow);

    assert!(matches!(event, WorkflowEvent::Completed));
    let snapshot = workflow.snapshot();
    assert_eq!(snapshot.annotated, Some(ANNOTATED));
    assert!(snapshot.detections.is_empty());
}
