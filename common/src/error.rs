//! Error types.

use thiserror::Error;

/// Workflow and backend error type.
///
/// Internally richer than what the user ever sees: the GUI collapses
/// every variant except `NoImageSelected` into one generic failure
/// notice, and any failure clears partial results and returns the
/// workflow to idle.
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("no image selected")]
    NoImageSelected,

    #[error("an analysis is already in progress")]
    AnalysisInProgress,

    #[error("backend returned status {0}")]
    Backend(u16),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not parse detections: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DetectError>;
