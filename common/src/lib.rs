//! Debris Detect Common Library
//!
//! Types, backend client, and the upload/analyze workflow shared by
//! the desktop app and the integration tests.

pub mod client;
pub mod config;
pub mod error;
pub mod parser;
pub mod types;
pub mod workflow;

pub use client::{DetectionBackend, HttpBackend};
pub use config::{BackendConfig, BACKEND_URL_ENV};
pub use error::{DetectError, Result};
pub use parser::{extract_json, parse_detections};
pub use types::{AnalysisOutcome, Detection, SelectedImage};
pub use workflow::{UploadWorkflow, WorkflowEvent, WorkflowSnapshot};
