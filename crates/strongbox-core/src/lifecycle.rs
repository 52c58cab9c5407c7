//! Create-if-absent policy for the vault key.
//!
//! `ensure_key` is the single code path that may create a key. The
//! check-then-act on first run is guarded by a mutex so concurrent callers
//! commit exactly one generation-and-save sequence.

use parking_lot::Mutex;

use crate::error::KeyStoreError;
use crate::key::SymmetricKey;
use crate::keystore::SecureKeyStore;

pub struct KeyLifecycleManager {
    store: SecureKeyStore,
    create_lock: Mutex<()>,
}

impl KeyLifecycleManager {
    pub fn new(store: SecureKeyStore) -> Self {
        Self {
            store,
            create_lock: Mutex::new(()),
        }
    }

    /// Return the vault key, generating and persisting one on first use.
    pub fn ensure_key(&self) -> Result<SymmetricKey, KeyStoreError> {
        let _guard = self.create_lock.lock();
        if let Some(key) = self.store.load()? {
            return Ok(key);
        }
        let key = SymmetricKey::generate();
        self.store.save(&key)?;
        Ok(key)
    }

    /// Remove the persisted key. The next `ensure_key` generates a fresh one;
    /// payloads sealed under the old key become unreadable.
    pub fn reset(&self) -> Result<(), KeyStoreError> {
        let _guard = self.create_lock.lock();
        self.store.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::MemoryBackend;
    use std::sync::Arc;

    fn manager_with_backend() -> (Arc<MemoryBackend>, KeyLifecycleManager) {
        let backend = Arc::new(MemoryBackend::new());
        let store = SecureKeyStore::for_owner(backend.clone(), "owner-1");
        (backend, KeyLifecycleManager::new(store))
    }

    #[test]
    fn first_call_creates_later_calls_reuse() {
        let (backend, manager) = manager_with_backend();
        let first = manager.ensure_key().unwrap();
        let second = manager.ensure_key().unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
        assert_eq!(backend.put_count(), 1);
    }

    #[test]
    fn reset_forces_a_new_key() {
        let (_, manager) = manager_with_backend();
        let first = manager.ensure_key().unwrap();
        manager.reset().unwrap();
        let second = manager.ensure_key().unwrap();
        assert_ne!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn concurrent_first_run_creates_exactly_one_key() {
        let backend = Arc::new(MemoryBackend::new());
        let store = SecureKeyStore::for_owner(backend.clone(), "owner-1");
        let manager = Arc::new(KeyLifecycleManager::new(store));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || manager.ensure_key().unwrap())
            })
            .collect();
        let keys: Vec<SymmetricKey> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let first = keys[0].as_bytes();
        assert!(keys.iter().all(|k| k.as_bytes() == first));
        assert_eq!(backend.put_count(), 1);
    }
}
