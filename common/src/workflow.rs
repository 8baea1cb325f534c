//! Upload/analyze workflow state machine.
//!
//! One analysis run is: upload the selected image, receive the
//! annotated image, fetch the detection list, install both together.
//! The workflow has exactly two states, idle and analyzing, and it
//! returns to idle unconditionally when a run finishes, whether it
//! succeeded or failed.
//!
//! Two deliberate behavioral choices, both stricter than the app this
//! replaces:
//!
//! - `start` while a run is outstanding is rejected with
//!   [`DetectError::AnalysisInProgress`] rather than racing.
//! - If the upload succeeds but the detections fetch fails, the
//!   annotated image from the upload step is discarded, so the UI
//!   never shows a result image without its matching detection list.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use crate::client::DetectionBackend;
use crate::error::{DetectError, Result};
use crate::types::{AnalysisOutcome, Detection, SelectedImage};

/// Completion notification for one analysis run.
#[derive(Debug)]
pub enum WorkflowEvent {
    Completed,
    Failed(DetectError),
}

/// Read-only view of the workflow state, for rendering.
pub struct WorkflowSnapshot<'a> {
    pub selected: Option<&'a SelectedImage>,
    pub annotated: Option<&'a [u8]>,
    pub detections: &'a [Detection],
    pub busy: bool,
}

/// Owns all client-side analysis state and mediates between the user
/// and the detection backend.
///
/// The two backend calls of a run execute strictly sequentially on a
/// worker thread; the caller drives completion by calling
/// [`UploadWorkflow::poll`] (per frame, in the GUI).
pub struct UploadWorkflow<B: DetectionBackend + 'static> {
    backend: Arc<B>,
    selected: Option<SelectedImage>,
    annotated: Option<Vec<u8>>,
    detections: Vec<Detection>,
    busy: bool,
    run_rx: Option<Receiver<Result<AnalysisOutcome>>>,
}

impl<B: DetectionBackend + 'static> UploadWorkflow<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            selected: None,
            annotated: None,
            detections: Vec::new(),
            busy: false,
            run_rx: None,
        }
    }

    /// Replace the selected image.
    ///
    /// Non-destructive to prior results: a previously displayed
    /// annotated image and detection list stay visible until the next
    /// [`UploadWorkflow::start`].
    pub fn select_image(&mut self, file_name: impl Into<String>, bytes: Vec<u8>) {
        self.selected = Some(SelectedImage {
            file_name: file_name.into(),
            bytes,
        });
    }

    /// Begin an analysis run.
    ///
    /// Rejects when no image is selected (the only user-input
    /// validation there is) and when a run is already outstanding.
    /// Either rejection performs no network activity and leaves the
    /// current results untouched.
    pub fn start(&mut self) -> Result<()> {
        if self.busy {
            return Err(DetectError::AnalysisInProgress);
        }
        let image = self.selected.as_ref().ok_or(DetectError::NoImageSelected)?;

        // Old results go away together before the first request, so a
        // stale list is never shown next to a fresh image.
        self.annotated = None;
        self.detections.clear();
        self.busy = true;

        let backend = Arc::clone(&self.backend);
        let file_name = image.file_name.clone();
        let bytes = image.bytes.clone();
        let (tx, rx) = mpsc::channel();
        self.run_rx = Some(rx);

        std::thread::spawn(move || {
            let outcome = run_once(backend.as_ref(), &file_name, bytes);
            let _ = tx.send(outcome);
        });

        Ok(())
    }

    /// Apply any finished run and report it.
    ///
    /// Returns `None` while idle or still analyzing. Clearing the busy
    /// flag is the final state change of a run, on success and on
    /// failure alike.
    pub fn poll(&mut self) -> Option<WorkflowEvent> {
        let rx = self.run_rx.as_ref()?;
        let outcome = rx.try_recv().ok()?;
        self.run_rx = None;

        let event = match outcome {
            Ok(AnalysisOutcome {
                annotated,
                detections,
            }) => {
                self.annotated = Some(annotated);
                self.detections = detections;
                WorkflowEvent::Completed
            }
            Err(err) => {
                self.annotated = None;
                self.detections.clear();
                WorkflowEvent::Failed(err)
            }
        };
        self.busy = false;
        Some(event)
    }

    pub fn snapshot(&self) -> WorkflowSnapshot<'_> {
        WorkflowSnapshot {
            selected: self.selected.as_ref(),
            annotated: self.annotated.as_deref(),
            detections: &self.detections,
            busy: self.busy,
        }
    }
}

/// One full run against the backend: upload, then detections.
fn run_once<B: DetectionBackend + ?Sized>(
    backend: &B,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<AnalysisOutcome> {
    tracing::info!(file_name, "analysis run started");
    let annotated = backend.upload(file_name, bytes)?;
    let detections = backend.detections()?;
    tracing::info!(count = detections.len(), "analysis run finished");
    Ok(AnalysisOutcome {
        annotated,
        detections,
    })
}
