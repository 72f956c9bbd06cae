//! Secure data handler — per-process symmetric encryption.
//!
//! Each handler instance generates its own ChaCha20-Poly1305 key. Ciphertext
//! produced by one instance is only decryptable by that same instance; the
//! key is never persisted, so nothing encrypted here survives a restart.
//!
//! Framing: 12-byte random nonce prepended to the AEAD ciphertext.

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};

use crate::error::CryptoError;

/// Nonce length for ChaCha20-Poly1305.
const NONCE_LEN: usize = 12;

/// Symmetric encryption handler with a per-instance key.
pub struct SecureDataHandler {
    cipher: ChaCha20Poly1305,
}

impl SecureDataHandler {
    /// Create a handler with a freshly generated key.
    pub fn new() -> Self {
        let key = ChaCha20Poly1305::generate_key(&mut OsRng);
        Self {
            cipher: ChaCha20Poly1305::new(&key),
        }
    }

    /// Encrypt a string. Output is nonce-prefixed AEAD ciphertext.
    pub fn encrypt(&self, data: &str) -> Result<Vec<u8>, CryptoError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, data.as_bytes())
            .map_err(|e| CryptoError::Encryption(format!("{e:?}")))?;

        let mut framed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        framed.extend_from_slice(nonce.as_slice());
        framed.extend(ciphertext);
        Ok(framed)
    }

    /// Decrypt nonce-prefixed ciphertext produced by [`encrypt`](Self::encrypt).
    ///
    /// Fails with [`CryptoError::Decryption`] if the ciphertext was produced
    /// under a different key, is truncated, or has been tampered with.
    pub fn decrypt(&self, framed: &[u8]) -> Result<String, CryptoError> {
        if framed.len() < NONCE_LEN {
            return Err(CryptoError::Decryption);
        }
        let (nonce, ciphertext) = framed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Decryption)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::Decryption)
    }

    /// Serialize a credential map to JSON, then encrypt it.
    pub fn seal_credentials(
        &self,
        credentials: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Vec<u8>, CryptoError> {
        let serialized = serde_json::to_string(credentials)?;
        self.encrypt(&serialized)
    }

    /// Decrypt and deserialize a credential map sealed by
    /// [`seal_credentials`](Self::seal_credentials).
    pub fn open_credentials(
        &self,
        framed: &[u8],
    ) -> Result<serde_json::Map<String, serde_json::Value>, CryptoError> {
        let serialized = self.decrypt(framed)?;
        Ok(serde_json::from_str(&serialized)?)
    }
}

impl Default for SecureDataHandler {
    fn default() -> Self {
        Self::new()
    }
}
