//! Credential entity and its encrypted stored form.
//!
//! Only the secret value is confidentiality-protected; name and category are
//! metadata and pass through in the clear. A payload that fails
//! authentication maps to `SecretValue::Undecryptable` — never to an empty
//! string a user could mistake for an intentionally blank password.

use serde::{Deserialize, Serialize};

use crate::cipher::{self, SealedPayload};
use crate::error::{KeyStoreError, MapperError};
use crate::lifecycle::KeyLifecycleManager;

/// In-memory credential. The secret exists in plaintext only here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub name: String,
    pub secret: SecretValue,
    pub category: String,
    pub owner_id: String,
}

/// Decrypted state of a credential's secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretValue {
    /// Plaintext as entered by the user (possibly empty).
    Plain(String),
    /// The stored payload failed authentication under the current key.
    Undecryptable,
}

impl SecretValue {
    pub fn is_readable(&self) -> bool {
        matches!(self, SecretValue::Plain(_))
    }
}

/// Wire/storage form. `password` holds the base64 sealed payload; `url`
/// doubles as the category. Record identity is assigned by the remote store
/// and travels outside the record body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub username: String,
    pub password: String,
    pub url: String,
}

/// Translates between the plaintext entity and the stored form, sealing and
/// opening through the vault key.
pub struct RecordMapper {
    keys: KeyLifecycleManager,
}

impl RecordMapper {
    pub fn new(keys: KeyLifecycleManager) -> Self {
        Self { keys }
    }

    pub fn to_stored(&self, record: &CredentialRecord) -> Result<StoredRecord, MapperError> {
        let plaintext = match &record.secret {
            SecretValue::Plain(value) => value.as_bytes(),
            SecretValue::Undecryptable => return Err(MapperError::Unreadable),
        };
        let key = self.keys.ensure_key()?;
        let sealed = cipher::seal(&key, plaintext)?;
        Ok(StoredRecord {
            username: record.name.clone(),
            password: sealed.to_base64(),
            url: record.category.clone(),
        })
    }

    /// Key-store faults abort — no record can be opened without the key.
    /// Per-record cipher failures degrade to `SecretValue::Undecryptable`.
    pub fn from_stored(
        &self,
        stored: &StoredRecord,
        owner_id: &str,
    ) -> Result<CredentialRecord, KeyStoreError> {
        let key = self.keys.ensure_key()?;
        let secret = match SealedPayload::from_base64(&stored.password)
            .and_then(|payload| cipher::open(&key, &payload))
        {
            Ok(plaintext) => match String::from_utf8(plaintext.to_vec()) {
                Ok(value) => SecretValue::Plain(value),
                Err(_) => SecretValue::Undecryptable,
            },
            Err(_) => SecretValue::Undecryptable,
        };
        Ok(CredentialRecord {
            name: stored.username.clone(),
            secret,
            category: stored.url.clone(),
            owner_id: owner_id.to_string(),
        })
    }

    /// Delete the persisted vault key (account reset).
    pub fn reset_key(&self) -> Result<(), KeyStoreError> {
        self.keys.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::{MemoryBackend, SecureKeyStore};
    use std::sync::Arc;

    fn mapper() -> RecordMapper {
        let backend = Arc::new(MemoryBackend::new());
        let store = SecureKeyStore::for_owner(backend, "u1");
        RecordMapper::new(KeyLifecycleManager::new(store))
    }

    fn record(secret: &str) -> CredentialRecord {
        CredentialRecord {
            name: "Mail".to_string(),
            secret: SecretValue::Plain(secret.to_string()),
            category: "Work".to_string(),
            owner_id: "u1".to_string(),
        }
    }

    #[test]
    fn stored_form_roundtrips() {
        let mapper = mapper();
        let stored = mapper.to_stored(&record("hunter2")).unwrap();
        assert_eq!(stored.username, "Mail");
        assert_eq!(stored.url, "Work");
        assert_ne!(stored.password, "hunter2");

        let restored = mapper.from_stored(&stored, "u1").unwrap();
        assert_eq!(restored, record("hunter2"));
    }

    #[test]
    fn plaintext_never_appears_in_stored_form() {
        let mapper = mapper();
        let stored = mapper.to_stored(&record("hunter2")).unwrap();
        let serialized = serde_json::to_string(&stored).unwrap();
        assert!(!serialized.contains("hunter2"));
    }

    #[test]
    fn empty_secret_stays_distinct_from_undecryptable() {
        let mapper = mapper();
        let stored = mapper.to_stored(&record("")).unwrap();
        let restored = mapper.from_stored(&stored, "u1").unwrap();
        assert_eq!(restored.secret, SecretValue::Plain(String::new()));
        assert!(restored.secret.is_readable());
    }

    #[test]
    fn truncated_payload_is_flagged_undecryptable() {
        let mapper = mapper();
        let mut stored = mapper.to_stored(&record("hunter2")).unwrap();
        stored.password.truncate(stored.password.len() - 4);
        let restored = mapper.from_stored(&stored, "u1").unwrap();
        assert_eq!(restored.secret, SecretValue::Undecryptable);
        assert_eq!(restored.name, "Mail");
    }

    #[test]
    fn unreadable_secret_is_refused_on_seal() {
        let mapper = mapper();
        let mut rec = record("hunter2");
        rec.secret = SecretValue::Undecryptable;
        assert!(matches!(
            mapper.to_stored(&rec),
            Err(MapperError::Unreadable)
        ));
    }

    #[test]
    fn key_reset_makes_old_payloads_undecryptable() {
        let mapper = mapper();
        let stored = mapper.to_stored(&record("hunter2")).unwrap();
        mapper.reset_key().unwrap();
        let restored = mapper.from_stored(&stored, "u1").unwrap();
        assert_eq!(restored.secret, SecretValue::Undecryptable);
    }
}
