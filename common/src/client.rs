//! HTTP backend client.
//!
//! The inference backend is an opaque collaborator with exactly two
//! endpoints: `POST /upload` (multipart, one `file` field, answers
//! with the annotated image bytes) and `GET /detections` (answers with
//! a JSON array of class/confidence records).

use crate::config::BackendConfig;
use crate::error::{DetectError, Result};
use crate::parser::parse_detections;
use crate::types::Detection;

/// Seam between the workflow and the inference backend.
///
/// Implementations run on the workflow's worker thread; the calls are
/// blocking and strictly sequential.
pub trait DetectionBackend: Send + Sync {
    /// Upload the selected image, returning the annotated image bytes.
    fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<Vec<u8>>;

    /// Fetch the detections for the most recent upload, in backend order.
    fn detections(&self) -> Result<Vec<Detection>>;
}

/// `DetectionBackend` over plain HTTP via `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl DetectionBackend for HttpBackend {
    fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<Vec<u8>> {
        let url = format!("{}/upload", self.base_url);
        tracing::debug!(%url, file_name, size = bytes.len(), "uploading image");

        let part = reqwest::blocking::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(guess_mime(file_name))
            .map_err(DetectError::Transport)?;
        let form = reqwest::blocking::multipart::Form::new().part("file", part);

        let response = self.client.post(&url).multipart(form).send()?;
        if !response.status().is_success() {
            return Err(DetectError::Backend(response.status().as_u16()));
        }

        let annotated = response.bytes()?.to_vec();
        tracing::debug!(size = annotated.len(), "received annotated image");
        Ok(annotated)
    }

    fn detections(&self) -> Result<Vec<Detection>> {
        let url = format!("{}/detections", self.base_url);
        tracing::debug!(%url, "fetching detections");

        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            return Err(DetectError::Backend(response.status().as_u16()));
        }

        let body = response.text()?;
        parse_detections(&body)
    }
}

/// Mime type from the file extension. The backend decodes whatever it
/// receives, so a wrong guess only affects the form metadata.
fn guess_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit('.')
        .next()
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "image/jpeg",
    }
}
