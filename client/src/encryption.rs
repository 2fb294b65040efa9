use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::error::{ClientError, Result};

const NONCE_LEN: usize = 12;

/// AES-256-GCM for small secrets stored on disk (the session token)
pub struct SessionCipher {
    cipher: Aes256Gcm,
}

impl SessionCipher {
    /// `key` is 32 bytes, base64 encoded
    pub fn from_base64_key(key: &str) -> Result<Self> {
        let key_bytes = BASE64
            .decode(key)
            .map_err(|e| ClientError::Crypto(format!("Failed to decode encryption key: {}", e)))?;

        if key_bytes.len() != 32 {
            return Err(ClientError::Crypto(
                "Encryption key must be 32 bytes".to_string(),
            ));
        }

        let cipher = Aes256Gcm::new_from_slice(&key_bytes)
            .map_err(|e| ClientError::Crypto(format!("Failed to create cipher: {}", e)))?;
        Ok(Self { cipher })
    }

    /// Random nonce prepended to the ciphertext, base64 encoded
    pub fn encrypt(&self, data: &str) -> Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, data.as_bytes())
            .map_err(|e| ClientError::Crypto(format!("Encryption failed: {}", e)))?;

        let mut result = nonce.to_vec();
        result.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(result))
    }

    pub fn decrypt(&self, encrypted_data: &str) -> Result<String> {
        let encrypted_bytes = BASE64
            .decode(encrypted_data)
            .map_err(|e| ClientError::Crypto(format!("Failed to decode encrypted data: {}", e)))?;

        if encrypted_bytes.len() < NONCE_LEN {
            return Err(ClientError::Crypto(
                "Invalid encrypted data: too short".to_string(),
            ));
        }

        let (nonce_bytes, ciphertext) = encrypted_bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| ClientError::Crypto(format!("Decryption failed: {}", e)))?;

        String::from_utf8(plaintext)
            .map_err(|e| ClientError::Crypto(format!("Decrypted data is not UTF-8: {}", e)))
    }
}
