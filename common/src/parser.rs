//! Detections response parser.
//!
//! The backend normally answers `/detections` with a bare JSON array,
//! but debug proxies and some serving stacks wrap the body in markdown
//! fences or log text, so extraction is tolerant.

use crate::error::{DetectError, Result};
use crate::types::Detection;

/// Extract the JSON array portion of a response body.
///
/// Extraction priority:
/// 1. ```json ... ``` fenced block
/// 2. outermost `[...]`
/// 3. error
///
/// # Examples
/// ```
/// use debris_detect_common::extract_json;
///
/// let body = r#"[{"class": "bottle", "confidence": 0.9}]"#;
/// let json = extract_json(body).unwrap();
/// assert!(json.contains("bottle"));
/// ```
pub fn extract_json(body: &str) -> Result<&str> {
    if let Some(start_marker) = body.find("```json") {
        let start = start_marker + 7; // length of "```json"
        if let Some(end_offset) = body[start..].find("```") {
            let end = start + end_offset;
            return Ok(body[start..end].trim());
        }
    }

    if let Some(start) = body.find('[') {
        if let Some(end) = body.rfind(']') {
            if end >= start {
                return Ok(&body[start..=end]);
            }
        }
    }

    Err(DetectError::Parse("no JSON array in response".into()))
}

/// Parse a `/detections` response body.
///
/// Backend-provided ordering is preserved; an empty array is a valid
/// result (nothing was detected).
pub fn parse_detections(body: &str) -> Result<Vec<Detection>> {
    let json_str = extract_json(body)?;
    let detections: Vec<Detection> = serde_json::from_str(json_str.trim())
        .map_err(|e| DetectError::Parse(format!("detections JSON: {}", e)))?;
    Ok(detections)
}
