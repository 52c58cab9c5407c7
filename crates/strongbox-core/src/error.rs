use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("secure storage backend error: {0}")]
    Backend(String),

    #[error("stored key material is corrupt: expected {expected} bytes, found {found}")]
    CorruptKey { expected: usize, found: usize },

    #[error("stored key material is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
}

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("authentication failed (payload tampered, truncated, or sealed under a different key)")]
    AuthenticationFailed,

    #[error("sealed payload is not valid base64: {0}")]
    Malformed(#[from] base64::DecodeError),

    #[error("AEAD encryption failed")]
    Encrypt,
}

#[derive(Debug, Error)]
pub enum MapperError {
    #[error("key store error: {0}")]
    KeyStore(#[from] KeyStoreError),

    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    #[error("record secret is unreadable; refusing to seal a placeholder")]
    Unreadable,
}
