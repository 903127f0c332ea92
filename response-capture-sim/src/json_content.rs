//! Content provider backed by JSON slide documents.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use response_capture_core::models::error::CaptureError;
use response_capture_core::models::stimulus::SlideConfig;
use response_capture_core::traits::ports::ContentProvider;

/// Loads `SlideConfig`s from inline documents or `<dir>/<slide_id>.json`.
///
/// ```json
/// {
///   "stimulus": { "url": "https://cdn.example/prompt.mp4", "maxReplays": 1 },
///   "policy": { "allowMultipleTakes": true, "maxTakes": 3,
///               "maxDurationSeconds": 60, "instantResponseRequired": false }
/// }
/// ```
#[derive(Debug, Default, Clone)]
pub struct JsonContentProvider {
    dir: Option<PathBuf>,
    documents: HashMap<String, String>,
}

impl JsonContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_directory(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            documents: HashMap::new(),
        }
    }

    /// Serve `json` for `slide_id`, taking precedence over the directory.
    pub fn with_document(mut self, slide_id: impl Into<String>, json: impl Into<String>) -> Self {
        self.documents.insert(slide_id.into(), json.into());
        self
    }

    fn read_document(&self, slide_id: &str) -> Result<String, CaptureError> {
        if let Some(json) = self.documents.get(slide_id) {
            return Ok(json.clone());
        }
        let dir = self
            .dir
            .as_ref()
            .ok_or_else(|| CaptureError::StimulusLoadFailure(format!("no document for slide {}", slide_id)))?;
        let path = dir.join(format!("{}.json", slide_id));
        fs::read_to_string(&path)
            .map_err(|e| CaptureError::StimulusLoadFailure(format!("failed to read {}: {}", path.display(), e)))
    }
}

impl ContentProvider for JsonContentProvider {
    fn load_slide_config(&self, slide_id: &str) -> Result<SlideConfig, CaptureError> {
        let json = self.read_document(slide_id)?;
        let config: SlideConfig = serde_json::from_str(&json)
            .map_err(|e| CaptureError::StimulusLoadFailure(format!("invalid slide document {}: {}", slide_id, e)))?;
        log::debug!("Loaded slide {} ({})", slide_id, config.stimulus.url);
        Ok(config)
    }
}
