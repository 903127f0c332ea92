use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;
use crate::traits::encryptor::TakeEncryptor;

/// Plaintext is sealed in slices of this size when encrypting.
pub const ENCRYPTED_CHUNK_SIZE: usize = 64 * 1024;

/// Streaming writer for a submitted take's media, with optional chunk
/// encryption.
///
/// ## File Format
///
/// **Plaintext (no encryptor):**
/// ```text
/// [raw container bytes...]
/// ```
///
/// **Encrypted (with encryptor):**
/// ```text
/// [Chunk 1: 4-byte LE length | sealed box (nonce + ciphertext + tag)]
/// [Chunk 2: ...]
/// ...
/// ```
pub struct TakeWriter {
    file_path: PathBuf,
    encryptor: Option<Box<dyn TakeEncryptor>>,
    file: Option<File>,
    total_bytes_written: u64,
}

impl TakeWriter {
    pub fn new(file_path: PathBuf, encryptor: Option<Box<dyn TakeEncryptor>>) -> Self {
        Self {
            file_path,
            encryptor,
            file: None,
            total_bytes_written: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn is_encrypted(&self) -> bool {
        self.encryptor.is_some()
    }

    /// Create the output file (and its directory).
    pub fn open(&mut self) -> Result<(), CaptureError> {
        if self.is_open() {
            return Ok(());
        }
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::StorageError(format!("failed to create directory: {}", e)))?;
        }
        let file = File::create(&self.file_path)
            .map_err(|e| CaptureError::StorageError(format!("failed to create file: {}", e)))?;
        self.file = Some(file);
        Ok(())
    }

    /// Write media bytes. Encrypted writers seal every slice of at most
    /// `ENCRYPTED_CHUNK_SIZE` bytes separately.
    pub fn write(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        if !self.is_open() {
            return Err(CaptureError::StorageError("file is not open for writing".into()));
        }

        let Some(encryptor) = self.encryptor.as_ref() else {
            return self.write_raw(data);
        };

        let mut sealed = Vec::new();
        for chunk in data.chunks(ENCRYPTED_CHUNK_SIZE) {
            let encrypted = encryptor
                .encrypt(chunk)
                .map_err(|e| CaptureError::EncryptionFailed(format!("chunk encryption failed: {}", e)))?;
            sealed.extend_from_slice(&(encrypted.len() as u32).to_le_bytes());
            sealed.extend_from_slice(&encrypted);
        }
        self.write_raw(&sealed)
    }

    /// Flush and close the file. Returns its SHA-256 hex digest.
    pub fn close(&mut self) -> Result<String, CaptureError> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| CaptureError::StorageError("file is not open".into()))?;
        file.flush().map_err(|e| CaptureError::StorageError(e.to_string()))?;
        drop(file);

        sha256_file(&self.file_path)
    }

    /// Total bytes on disk so far (length prefixes and sealing overhead included).
    pub fn bytes_written(&self) -> u64 {
        self.total_bytes_written
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CaptureError::StorageError("file is not open".into()))?;
        file.write_all(data)
            .map_err(|e| CaptureError::StorageError(format!("write failed: {}", e)))?;
        self.total_bytes_written += data.len() as u64;
        Ok(())
    }
}

/// Compute SHA-256 hex digest of a file.
pub fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let data =
        fs::read(path).map_err(|e| CaptureError::StorageError(format!("failed to read file for checksum: {}", e)))?;
    Ok(hex_encode(&Sha256::digest(&data)))
}

pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
