use std::collections::HashMap;

/// Streaming encryption interface for stored take media.
///
/// Encrypted chunk format:
/// ```text
/// [12-byte nonce] [ciphertext] [16-byte GCM authentication tag]
/// ```
pub trait TakeEncryptor: Send + Sync {
    /// Encrypt a chunk of media.
    ///
    /// Returns: `nonce (12 bytes) || ciphertext || tag (16 bytes)`
    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, String>;

    /// Metadata about the encryption key (e.g., key ID, creation date).
    fn key_metadata(&self) -> HashMap<String, String>;

    /// Algorithm identifier (e.g., "AES-256-GCM").
    fn algorithm(&self) -> &str;

    fn clone_box(&self) -> Box<dyn TakeEncryptor>;
}

impl Clone for Box<dyn TakeEncryptor> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
