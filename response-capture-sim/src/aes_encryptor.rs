use std::collections::HashMap;

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key};

use response_capture_core::traits::encryptor::TakeEncryptor;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Hardcoded 32-byte demo key.
const DEMO_KEY_BYTES: [u8; 32] = [
    0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
    0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F, 0x10,
    0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18,
    0x19, 0x1A, 0x1B, 0x1C, 0x1D, 0x1E, 0x1F, 0x20,
];

/// AES-256-GCM take encryptor.
///
/// Sealed chunk format: `nonce (12B) || ciphertext || tag (16B)`.
#[derive(Clone)]
pub struct AesGcmTakeEncryptor {
    key: [u8; 32],
    key_id: String,
    cipher: Aes256Gcm,
}

impl AesGcmTakeEncryptor {
    pub fn new(key: [u8; 32], key_id: impl Into<String>) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key)),
            key,
            key_id: key_id.into(),
        }
    }

    /// Encryptor with a well-known key. **NOT FOR PRODUCTION.**
    pub fn demo() -> Self {
        Self::new(DEMO_KEY_BYTES, "demo-key-v1")
    }

    /// Open one sealed chunk.
    pub fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>, String> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(format!("sealed chunk too short: {} bytes", sealed.len()));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher
            .decrypt(GenericArray::from_slice(nonce), ciphertext)
            .map_err(|e| format!("AES-GCM decryption failed: {}", e))
    }

    /// Decrypt a whole file of length-prefixed sealed chunks.
    pub fn decrypt_chunked(&self, data: &[u8]) -> Result<Vec<u8>, String> {
        let mut plain = Vec::new();
        let mut rest = data;
        while !rest.is_empty() {
            if rest.len() < 4 {
                return Err("truncated chunk length".into());
            }
            let (len_bytes, tail) = rest.split_at(4);
            let len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
            if tail.len() < len {
                return Err(format!("truncated chunk: want {} bytes, have {}", len, tail.len()));
            }
            let (sealed, next) = tail.split_at(len);
            plain.extend_from_slice(&self.decrypt(sealed)?);
            rest = next;
        }
        Ok(plain)
    }
}

impl TakeEncryptor for AesGcmTakeEncryptor {
    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, data)
            .map_err(|e| format!("AES-GCM encryption failed: {}", e))?;

        // aes-gcm appends the tag to the ciphertext; prepend the nonce.
        let mut combined = Vec::with_capacity(nonce.len() + ciphertext.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&ciphertext);
        Ok(combined)
    }

    fn key_metadata(&self) -> HashMap<String, String> {
        let mut meta = HashMap::new();
        meta.insert("keyId".to_string(), self.key_id.clone());
        meta.insert("algorithm".to_string(), self.algorithm().to_string());
        if self.key == DEMO_KEY_BYTES {
            meta.insert("warning".to_string(), "DEMO KEY, NOT FOR PRODUCTION".to_string());
        }
        meta
    }

    fn algorithm(&self) -> &str {
        "AES-256-GCM"
    }

    fn clone_box(&self) -> Box<dyn TakeEncryptor> {
        Box::new(self.clone())
    }
}
