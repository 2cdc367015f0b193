//! Reversible encryption for email addresses at rest.
//!
//! Emails are sealed with AES-256-GCM under the server key and stored as
//! `"<nonce hex>:<ciphertext hex>"`, with a fresh random nonce per value. The
//! same address therefore encrypts differently every time, so duplicate checks
//! have to decrypt.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};

use crate::error::AppError;

const NONCE_LEN: usize = 12;

/// Returned in place of an email that can no longer be decrypted.
pub const PLACEHOLDER_EMAIL: &str = "decryption-error@example.com";

#[derive(Clone)]
pub struct EmailCipher {
    cipher: Aes256Gcm,
}

impl EmailCipher {
    pub fn new(key: &[u8; 32]) -> Result<Self, AppError> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| AppError::Crypto(format!("Failed to create cipher: {}", e)))?;
        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, AppError> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|e| AppError::Crypto(format!("Encryption failed: {}", e)))?;

        Ok(format!("{}:{}", hex::encode(nonce_bytes), hex::encode(ciphertext)))
    }

    pub fn decrypt(&self, sealed: &str) -> Result<String, AppError> {
        let (nonce_hex, ciphertext_hex) = sealed
            .split_once(':')
            .ok_or_else(|| AppError::Crypto("Missing nonce separator".to_string()))?;
        let nonce = hex::decode(nonce_hex)
            .map_err(|e| AppError::Crypto(format!("Invalid nonce hex: {}", e)))?;
        if nonce.len() != NONCE_LEN {
            return Err(AppError::Crypto(format!(
                "Nonce must be {} bytes, got {}",
                NONCE_LEN,
                nonce.len()
            )));
        }
        let ciphertext = hex::decode(ciphertext_hex)
            .map_err(|e| AppError::Crypto(format!("Invalid ciphertext hex: {}", e)))?;

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
            .map_err(|e| AppError::Crypto(format!("Decryption failed: {}", e)))?;

        String::from_utf8(plaintext).map_err(|e| AppError::Crypto(e.to_string()))
    }

    /// Decrypts for display, logging and masking any failure.
    pub fn decrypt_or_placeholder(&self, sealed: &str) -> String {
        self.decrypt(sealed).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not decrypt stored email");
            PLACEHOLDER_EMAIL.to_string()
        })
    }
}
