//! Credential flows: save, load, delete, filter.
//!
//! A save is durable only once the remote put acknowledges. The in-memory
//! session list reflects the record optimistically; a failed put leaves the
//! entry flagged `Failed` so the caller can retry or discard it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use strongbox_core::record::{CredentialRecord, RecordMapper, SecretValue};

use crate::error::SyncError;
use crate::remote::{RecordId, RemoteStore};

/// Acknowledgement state of a session-list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Remote write in flight.
    Pending,
    /// Acknowledged by the remote store.
    Synced,
    /// Remote write failed; retry or discard.
    Failed,
}

#[derive(Debug, Clone)]
pub struct VaultEntry {
    /// Store-assigned id; `None` until the remote write acknowledges.
    pub id: Option<RecordId>,
    pub record: CredentialRecord,
    pub state: SyncState,
    local: u64,
}

/// Per-owner credential flows over a remote store and the record mapper.
/// The owner id comes from the identity provider at construction.
pub struct CredentialService {
    mapper: RecordMapper,
    remote: Arc<dyn RemoteStore>,
    owner_id: String,
    entries: RwLock<Vec<VaultEntry>>,
    next_local: AtomicU64,
}

impl CredentialService {
    pub fn new(mapper: RecordMapper, remote: Arc<dyn RemoteStore>, owner_id: &str) -> Self {
        Self {
            mapper,
            remote,
            owner_id: owner_id.to_string(),
            entries: RwLock::new(Vec::new()),
            next_local: AtomicU64::new(0),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Seal and store one credential. The session list reflects the record
    /// immediately; on a remote failure the entry stays flagged `Failed` and
    /// the error is surfaced.
    pub async fn save(
        &self,
        name: &str,
        secret: &str,
        category: &str,
    ) -> Result<VaultEntry, SyncError> {
        let record = CredentialRecord {
            name: name.to_string(),
            secret: SecretValue::Plain(secret.to_string()),
            category: category.to_string(),
            owner_id: self.owner_id.clone(),
        };
        let stored = self.mapper.to_stored(&record)?;

        let local = self.next_local.fetch_add(1, Ordering::SeqCst);
        {
            let mut entries = self.entries.write().await;
            entries.push(VaultEntry {
                id: None,
                record: record.clone(),
                state: SyncState::Pending,
                local,
            });
        }

        match self.remote.put(&self.owner_id, &stored).await {
            Ok(id) => {
                let entry = VaultEntry {
                    id: Some(id),
                    record,
                    state: SyncState::Synced,
                    local,
                };
                self.replace(local, entry.clone()).await;
                debug!(name, "credential saved");
                Ok(entry)
            }
            Err(e) => {
                self.mark_failed(local).await;
                warn!(error = %e, "remote write failed; entry kept for reconciliation");
                Err(e.into())
            }
        }
    }

    /// Fetch and decrypt every record for the owner. One undecryptable
    /// record never fails the batch; key-store faults do. Entries not yet
    /// acknowledged by the remote survive the refresh.
    pub async fn load_all(&self) -> Result<Vec<VaultEntry>, SyncError> {
        let fetched = self.remote.fetch_all(&self.owner_id).await?;
        let mut loaded = Vec::with_capacity(fetched.len());
        for (id, stored) in fetched {
            let record = self
                .mapper
                .from_stored(&stored, &self.owner_id)
                .map_err(SyncError::KeyStore)?;
            if !record.secret.is_readable() {
                warn!(name = %record.name, "stored payload failed authentication");
            }
            loaded.push(VaultEntry {
                id: Some(id),
                record,
                state: SyncState::Synced,
                local: self.next_local.fetch_add(1, Ordering::SeqCst),
            });
        }

        let mut entries = self.entries.write().await;
        let unacked: Vec<VaultEntry> = entries
            .iter()
            .filter(|e| e.state != SyncState::Synced)
            .cloned()
            .collect();
        *entries = loaded;
        entries.extend(unacked);
        Ok(entries.clone())
    }

    /// Current session list without touching the remote store.
    pub async fn entries(&self) -> Vec<VaultEntry> {
        self.entries.read().await.clone()
    }

    /// Re-attempt remote writes for entries flagged `Failed`. Returns how
    /// many became `Synced`. Each retry seals with a fresh nonce.
    pub async fn retry_failed(&self) -> Result<usize, SyncError> {
        let failed: Vec<(u64, CredentialRecord)> = {
            let entries = self.entries.read().await;
            entries
                .iter()
                .filter(|e| e.state == SyncState::Failed)
                .map(|e| (e.local, e.record.clone()))
                .collect()
        };

        let mut recovered = 0;
        for (local, record) in failed {
            let stored = self.mapper.to_stored(&record)?;
            match self.remote.put(&self.owner_id, &stored).await {
                Ok(id) => {
                    let entry = VaultEntry {
                        id: Some(id),
                        record,
                        state: SyncState::Synced,
                        local,
                    };
                    self.replace(local, entry).await;
                    recovered += 1;
                }
                Err(e) => warn!(error = %e, "retry failed"),
            }
        }
        Ok(recovered)
    }

    /// Drop entries flagged `Failed` from the session list. Returns how many
    /// were removed.
    pub async fn discard_failed(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.state != SyncState::Failed);
        before - entries.len()
    }

    /// Case-insensitive name match over the session list. Filtering happens
    /// after decryption, in memory; nothing is delegated to the remote store.
    pub async fn search(&self, query: &str) -> Vec<VaultEntry> {
        let query = query.to_lowercase();
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.record.name.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }

    pub async fn in_category(&self, category: &str) -> Vec<VaultEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.record.category == category)
            .cloned()
            .collect()
    }

    /// Destroy one stored credential.
    pub async fn delete(&self, id: &RecordId) -> Result<(), SyncError> {
        self.remote.delete(&self.owner_id, id).await?;
        let mut entries = self.entries.write().await;
        entries.retain(|e| e.id.as_deref() != Some(id.as_str()));
        Ok(())
    }

    /// Delete the vault key. Records sealed under it become unreadable.
    pub fn reset_key(&self) -> Result<(), SyncError> {
        self.mapper.reset_key().map_err(SyncError::KeyStore)
    }

    async fn replace(&self, local: u64, entry: VaultEntry) {
        let mut entries = self.entries.write().await;
        if let Some(slot) = entries.iter_mut().find(|e| e.local == local) {
            *slot = entry;
        }
    }

    async fn mark_failed(&self, local: u64) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.iter_mut().find(|e| e.local == local) {
            entry.state = SyncState::Failed;
        }
    }
}
