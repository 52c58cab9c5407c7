use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::KeyStoreError;

pub const KEY_LEN: usize = 32;

/// 256-bit symmetric vault key. Opaque: no serialization, redacted Debug.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    /// Generate a fresh key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Rebuild a key from stored bytes. Anything other than 32 bytes means
    /// the stored material is corrupt.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyStoreError> {
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| KeyStoreError::CorruptKey {
            expected: KEY_LEN,
            found: bytes.len(),
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}
