//! strongbox-core — key lifecycle and sealed-record primitives
//!
//! # Design principles
//! - NO custom crypto; the AEAD comes from the audited `chacha20poly1305` crate.
//! - Key material is zeroized on drop and never logged.
//! - Absence of a key is a normal first-run state; storage faults are errors.
//! - A payload that fails authentication maps to an explicit unreadable
//!   marker, never to an empty secret.
//!
//! # Module layout
//! - `key`       — 256-bit symmetric key newtype
//! - `keystore`  — owner-scoped durable key storage over a pluggable secret backend
//! - `lifecycle` — create-if-absent key policy (the only key-creating path)
//! - `cipher`    — XChaCha20-Poly1305 seal/open + base64 wire framing
//! - `record`    — credential entity <-> encrypted stored form
//! - `error`     — typed error enums

pub mod cipher;
pub mod error;
pub mod key;
pub mod keystore;
pub mod lifecycle;
pub mod record;

pub use error::{CipherError, KeyStoreError, MapperError};
pub use key::SymmetricKey;
