//! Core types shared between the workflow and the GUI.

use serde::{Deserialize, Serialize};

/// One recognized object reported by the backend.
///
/// Confidence is expected in [0,1] but carried exactly as the backend
/// sent it, never clamped or re-scaled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class: String,
    pub confidence: f64,
}

impl Detection {
    /// Confidence as a percentage with one decimal: 0.932 -> "93.2%".
    pub fn confidence_percent(&self) -> String {
        format!("{:.1}%", self.confidence * 100.0)
    }
}

/// The file the user picked. Owned exclusively by the workflow;
/// replaced wholesale on the next selection.
#[derive(Debug, Clone, Default)]
pub struct SelectedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// The paired product of one successful analysis run.
///
/// The annotated image and the detection list only ever travel
/// together, so the UI can never show one without the matching other.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOutcome {
    pub annotated: Vec<u8>,
    pub detections: Vec<Detection>,
}
