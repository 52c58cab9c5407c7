//! Authenticated encryption for credential secrets.
//!
//! Uses XChaCha20-Poly1305 (192-bit nonce).
//! Key size: 32 bytes.  Nonce: 24 bytes (random, fresh per seal).  Tag: 16 bytes.
//!
//! Storage wire format (one base64 string):
//!   [ nonce (24 bytes) | ciphertext + tag ]

use base64::{engine::general_purpose, Engine as _};
use chacha20poly1305::aead::{Aead, KeyInit, OsRng};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::CipherError;
use crate::key::SymmetricKey;

pub const NONCE_LEN: usize = 24;
pub const TAG_LEN: usize = 16;

/// Output of one seal operation; consumed by exactly one open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext with the Poly1305 tag appended.
    pub ciphertext: Vec<u8>,
}

/// Encrypt and authenticate `plaintext`, generating a fresh random nonce.
pub fn seal(key: &SymmetricKey, plaintext: &[u8]) -> Result<SealedPayload, CipherError> {
    let cipher =
        XChaCha20Poly1305::new_from_slice(key.as_bytes()).map_err(|_| CipherError::Encrypt)?;
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| CipherError::Encrypt)?;
    Ok(SealedPayload { nonce, ciphertext })
}

/// Verify the authentication tag and decrypt. No plaintext is released on a
/// tag mismatch, truncated input, or key mismatch.
pub fn open(key: &SymmetricKey, payload: &SealedPayload) -> Result<Zeroizing<Vec<u8>>, CipherError> {
    if payload.ciphertext.len() < TAG_LEN {
        return Err(CipherError::AuthenticationFailed);
    }
    let cipher = XChaCha20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|_| CipherError::AuthenticationFailed)?;
    let nonce = XNonce::from_slice(&payload.nonce);
    let plaintext = cipher
        .decrypt(nonce, payload.ciphertext.as_slice())
        .map_err(|_| CipherError::AuthenticationFailed)?;
    Ok(Zeroizing::new(plaintext))
}

impl SealedPayload {
    /// Encode as the storage string: base64(nonce || ciphertext+tag).
    pub fn to_base64(&self) -> String {
        let mut combined = Vec::with_capacity(NONCE_LEN + self.ciphertext.len());
        combined.extend_from_slice(&self.nonce);
        combined.extend_from_slice(&self.ciphertext);
        general_purpose::STANDARD.encode(combined)
    }

    /// Decode the storage string. The minimum length (nonce + tag) is
    /// validated before the nonce is sliced out.
    pub fn from_base64(encoded: &str) -> Result<Self, CipherError> {
        let combined = general_purpose::STANDARD.decode(encoded)?;
        if combined.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::AuthenticationFailed);
        }
        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);
        Ok(Self {
            nonce,
            ciphertext: ciphertext.to_vec(),
        })
    }
}
