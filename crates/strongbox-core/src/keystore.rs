//! Durable, owner-scoped storage of the vault key.
//!
//! The platform boundary is the `SecretBackend` trait: insert-or-replace /
//! query / delete on a (service, account) identity pair. Production routes to
//! the OS credential store through the `keyring` crate; tests inject
//! `MemoryBackend`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use keyring::Entry;
use parking_lot::Mutex;

use crate::error::KeyStoreError;
use crate::key::SymmetricKey;

pub const KEYRING_SERVICE: &str = "Strongbox";
const KEY_ACCOUNT_PREFIX: &str = "encryption_key";

/// Platform secret-storage boundary.
pub trait SecretBackend: Send + Sync {
    /// Insert-or-replace the value stored under (service, account).
    fn put(&self, service: &str, account: &str, value: &[u8]) -> Result<(), KeyStoreError>;
    /// `Ok(None)` when nothing is stored under (service, account).
    fn get(&self, service: &str, account: &str) -> Result<Option<Vec<u8>>, KeyStoreError>;
    /// Idempotent delete.
    fn delete(&self, service: &str, account: &str) -> Result<(), KeyStoreError>;
}

/// OS credential store (Keychain / Credential Manager / Secret Service).
/// Values are base64-encoded because keyring entries are strings.
pub struct KeyringBackend;

impl SecretBackend for KeyringBackend {
    fn put(&self, service: &str, account: &str, value: &[u8]) -> Result<(), KeyStoreError> {
        let entry =
            Entry::new(service, account).map_err(|e| KeyStoreError::Backend(e.to_string()))?;
        let encoded = general_purpose::STANDARD.encode(value);
        entry
            .set_password(&encoded)
            .map_err(|e| KeyStoreError::Backend(e.to_string()))
    }

    fn get(&self, service: &str, account: &str) -> Result<Option<Vec<u8>>, KeyStoreError> {
        let entry =
            Entry::new(service, account).map_err(|e| KeyStoreError::Backend(e.to_string()))?;
        let encoded = match entry.get_password() {
            Ok(encoded) => encoded,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(e) => return Err(KeyStoreError::Backend(e.to_string())),
        };
        Ok(Some(general_purpose::STANDARD.decode(encoded)?))
    }

    fn delete(&self, service: &str, account: &str) -> Result<(), KeyStoreError> {
        let entry =
            Entry::new(service, account).map_err(|e| KeyStoreError::Backend(e.to_string()))?;
        match entry.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(KeyStoreError::Backend(e.to_string())),
        }
    }
}

/// In-memory backend for tests. Counts writes so first-run race tests can
/// assert exactly one save.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<(String, String), Vec<u8>>>,
    puts: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

impl SecretBackend for MemoryBackend {
    fn put(&self, service: &str, account: &str, value: &[u8]) -> Result<(), KeyStoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .insert((service.to_string(), account.to_string()), value.to_vec());
        Ok(())
    }

    fn get(&self, service: &str, account: &str) -> Result<Option<Vec<u8>>, KeyStoreError> {
        Ok(self
            .entries
            .lock()
            .get(&(service.to_string(), account.to_string()))
            .cloned())
    }

    fn delete(&self, service: &str, account: &str) -> Result<(), KeyStoreError> {
        self.entries
            .lock()
            .remove(&(service.to_string(), account.to_string()));
        Ok(())
    }
}

/// Owner-scoped view over a secret backend, holding exactly one vault key.
pub struct SecureKeyStore {
    backend: Arc<dyn SecretBackend>,
    service: String,
    account: String,
}

impl SecureKeyStore {
    pub fn for_owner(backend: Arc<dyn SecretBackend>, owner_id: &str) -> Self {
        Self {
            backend,
            service: KEYRING_SERVICE.to_string(),
            account: format!("{KEY_ACCOUNT_PREFIX}:{owner_id}"),
        }
    }

    /// Persist the key, fully replacing any prior one.
    pub fn save(&self, key: &SymmetricKey) -> Result<(), KeyStoreError> {
        self.backend.delete(&self.service, &self.account)?;
        self.backend.put(&self.service, &self.account, key.as_bytes())
    }

    /// `Ok(None)` when no key has ever been saved — a normal first-run state.
    pub fn load(&self) -> Result<Option<SymmetricKey>, KeyStoreError> {
        match self.backend.get(&self.service, &self.account)? {
            Some(bytes) => Ok(Some(SymmetricKey::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Delete the stored key. Not an error when nothing was present.
    pub fn reset(&self) -> Result<(), KeyStoreError> {
        self.backend.delete(&self.service, &self.account)
    }
}
