use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;
use crate::models::stimulus::{ReplayState, SlideKey};
use crate::models::take::Take;
use crate::storage::metadata::{write_metadata, SubmissionMetadata};
use crate::storage::take_writer::{hex_encode, TakeWriter};
use crate::traits::encryptor::TakeEncryptor;
use crate::traits::ports::ResponseStore;

const VIEW_STATE_FILE: &str = "view_state.json";

/// Where and how the file store persists data.
#[derive(Clone, Default)]
pub struct StorageConfig {
    pub root: PathBuf,
    /// When set, submitted media is written as sealed chunks.
    pub encryptor: Option<Box<dyn TakeEncryptor>>,
}

impl StorageConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            encryptor: None,
        }
    }

    pub fn with_encryptor(mut self, encryptor: Box<dyn TakeEncryptor>) -> Self {
        self.encryptor = Some(encryptor);
        self
    }
}

/// Filesystem-backed `ResponseStore`.
///
/// ```text
/// <root>/<user>/<slide>/view_state.json
/// <root>/<user>/<slide>/response_<take>.<ext>[.enc]
/// <root>/<user>/<slide>/response_<take>.metadata.json
/// ```
pub struct FileResponseStore {
    config: StorageConfig,
}

impl FileResponseStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Directory holding everything stored for one (user, slide) pair.
    pub fn slide_dir(&self, key: &SlideKey) -> PathBuf {
        self.config
            .root
            .join(path_component(&key.user_id))
            .join(path_component(&key.slide_id))
    }

    /// Media file path a take is submitted to.
    pub fn media_path(&self, key: &SlideKey, take: &Take) -> PathBuf {
        let mut name = format!("response_{}.{}", take.id.0, extension_for(&take.mime_type));
        if self.config.encryptor.is_some() {
            name.push_str(".enc");
        }
        self.slide_dir(key).join(name)
    }
}

impl ResponseStore for FileResponseStore {
    fn load_view_state(&self, key: &SlideKey) -> Result<Option<ReplayState>, CaptureError> {
        let path = self.slide_dir(key).join(VIEW_STATE_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .map_err(|e| CaptureError::StorageError(format!("failed to read view state: {}", e)))?;
        let state = serde_json::from_str(&json)
            .map_err(|e| CaptureError::StorageError(format!("failed to parse view state: {}", e)))?;
        Ok(Some(state))
    }

    fn save_view_state(&self, key: &SlideKey, state: ReplayState) -> Result<(), CaptureError> {
        let dir = self.slide_dir(key);
        fs::create_dir_all(&dir)
            .map_err(|e| CaptureError::StorageError(format!("failed to create directory: {}", e)))?;
        let json = serde_json::to_string_pretty(&state)
            .map_err(|e| CaptureError::StorageError(format!("failed to serialize view state: {}", e)))?;
        fs::write(dir.join(VIEW_STATE_FILE), json)
            .map_err(|e| CaptureError::StorageError(format!("failed to write view state: {}", e)))?;
        log::debug!("[{}] view state saved ({} views)", key, state.view_count);
        Ok(())
    }

    fn submit_response(&self, key: &SlideKey, take: &Take) -> Result<(), CaptureError> {
        let path = self.media_path(key, take);
        let mut writer = TakeWriter::new(path.clone(), self.config.encryptor.clone());
        writer.open()?;
        writer.write(&take.media_bytes)?;
        let checksum = writer.close()?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let mut metadata = SubmissionMetadata::for_take(key, take, &file_name, &checksum);
        if let Some(encryptor) = &self.config.encryptor {
            metadata = metadata.with_encryption(encryptor.algorithm(), encryptor.key_metadata());
        }
        write_metadata(&metadata, &path)?;

        log::info!(
            "[{}] {} stored at {} ({} bytes on disk, sha256 {})",
            key,
            take.id,
            path.display(),
            writer.bytes_written(),
            checksum
        );
        Ok(())
    }
}

/// File extension for a recorder MIME type such as `video/webm;codecs=vp8`.
fn extension_for(mime_type: &str) -> &'static str {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    match essence {
        "video/webm" | "audio/webm" => "webm",
        "video/mp4" | "audio/mp4" => "mp4",
        "video/quicktime" => "mov",
        "video/ogg" | "audio/ogg" => "ogg",
        _ => "bin",
    }
}

/// Keep identifiers from escaping the storage root.
///
/// Safe identifiers are used as-is. Anything else is cleaned and suffixed
/// with `.` plus a digest of the raw id; `.` never occurs in a safe
/// identifier, so distinct ids never share a directory.
fn path_component(id: &str) -> String {
    let is_safe = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
    if !id.is_empty() && id.chars().all(is_safe) {
        return id.to_string();
    }
    let cleaned: String = id.chars().map(|c| if is_safe(c) { c } else { '_' }).collect();
    let digest = hex_encode(&Sha256::digest(id.as_bytes()));
    format!("{}.{}", if cleaned.is_empty() { "_" } else { cleaned.as_str() }, &digest[..16])
}
