use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::error::CaptureError;
use crate::models::stimulus::SlideKey;
use crate::models::take::Take;

/// Metadata stored alongside a submitted take.
///
/// Serializable for JSON export to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionMetadata {
    pub id: String,
    pub user_id: String,
    pub slide_id: String,
    pub take_id: u64,
    pub recorded_at: String,
    pub submitted_at: String,
    pub duration_secs: f64,
    pub size_bytes: usize,
    pub mime_type: String,
    pub file_name: String,
    pub checksum: String,
    pub is_encrypted: bool,
    pub encryption_algorithm: Option<String>,
    #[serde(default)]
    pub encryption_key_metadata: HashMap<String, String>,
}

impl SubmissionMetadata {
    pub fn for_take(key: &SlideKey, take: &Take, file_name: &str, checksum: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: key.user_id.clone(),
            slide_id: key.slide_id.clone(),
            take_id: take.id.0,
            recorded_at: take.recorded_at.to_rfc3339(),
            submitted_at: chrono::Utc::now().to_rfc3339(),
            duration_secs: take.duration_secs,
            size_bytes: take.media_bytes.len(),
            mime_type: take.mime_type.clone(),
            file_name: file_name.to_string(),
            checksum: checksum.to_string(),
            is_encrypted: false,
            encryption_algorithm: None,
            encryption_key_metadata: HashMap::new(),
        }
    }

    pub fn with_encryption(mut self, algorithm: &str, key_metadata: HashMap<String, String>) -> Self {
        self.is_encrypted = true;
        self.encryption_algorithm = Some(algorithm.to_string());
        self.encryption_key_metadata = key_metadata;
        self
    }
}

/// `response_3.webm.enc` → `response_3.metadata.json`
pub fn sidecar_path(media_path: &Path) -> PathBuf {
    let stem = media_path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('.').next())
        .unwrap_or("response");
    media_path.with_file_name(format!("{}.metadata.json", stem))
}

/// Write submission metadata as a JSON sidecar next to the media file.
pub fn write_metadata(metadata: &SubmissionMetadata, media_path: &Path) -> Result<PathBuf, CaptureError> {
    let metadata_path = sidecar_path(media_path);
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| CaptureError::StorageError(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&metadata_path, json)
        .map_err(|e| CaptureError::StorageError(format!("failed to write metadata: {}", e)))?;
    Ok(metadata_path)
}

/// Read submission metadata from the sidecar of a media file.
pub fn read_metadata(media_path: &Path) -> Result<SubmissionMetadata, CaptureError> {
    let metadata_path = sidecar_path(media_path);
    let json = fs::read_to_string(&metadata_path)
        .map_err(|e| CaptureError::StorageError(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json).map_err(|e| CaptureError::StorageError(format!("failed to parse metadata: {}", e)))
}
