//! Opaque per-owner record store.
//!
//! The remote backend only handles `StoredRecord`s whose secret field is an
//! opaque base64 string. Put creates one record under the owner's collection;
//! fetch returns every record for the owner. No filtering is delegated to
//! this layer.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use strongbox_core::record::StoredRecord;

use crate::error::RemoteStoreError;

/// Store-assigned record identity, like a document id.
pub type RecordId = String;

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Create one record under the owner's collection; the store assigns the id.
    async fn put(&self, owner_id: &str, record: &StoredRecord)
        -> Result<RecordId, RemoteStoreError>;
    /// Fetch every record under the owner's collection.
    async fn fetch_all(
        &self,
        owner_id: &str,
    ) -> Result<Vec<(RecordId, StoredRecord)>, RemoteStoreError>;
    /// Delete one record.
    async fn delete(&self, owner_id: &str, id: &RecordId) -> Result<(), RemoteStoreError>;
}

/// HTTP client for the remote document store.
#[derive(Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct PutResponse {
    id: String,
}

#[derive(Deserialize)]
struct FetchResponse {
    records: Vec<FetchedRecord>,
    #[serde(default)]
    next_page: Option<String>,
}

#[derive(Deserialize)]
struct FetchedRecord {
    id: String,
    #[serde(flatten)]
    record: StoredRecord,
}

impl HttpRemoteStore {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self, RemoteStoreError> {
        let client = reqwest::Client::builder()
            .user_agent("strongbox-sync/0.1")
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            token,
        })
    }

    fn collection_url(&self, owner_id: &str) -> String {
        format!("{}/users/{}/passwords", self.base_url, owner_id)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn fetch_page(
        &self,
        owner_id: &str,
        page_token: Option<&str>,
    ) -> Result<FetchResponse, RemoteStoreError> {
        let mut req = self.client.get(self.collection_url(owner_id));
        if let Some(token) = page_token {
            req = req.query(&[("page_token", token)]);
        }
        let res = self.authorize(req).send().await?;
        if !res.status().is_success() {
            return Err(RemoteStoreError::Status(res.status()));
        }
        res.json::<FetchResponse>()
            .await
            .map_err(|e| RemoteStoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn put(
        &self,
        owner_id: &str,
        record: &StoredRecord,
    ) -> Result<RecordId, RemoteStoreError> {
        let req = self.client.post(self.collection_url(owner_id)).json(record);
        let res = self.authorize(req).send().await?;
        if !res.status().is_success() {
            return Err(RemoteStoreError::Status(res.status()));
        }
        let body: PutResponse = res
            .json()
            .await
            .map_err(|e| RemoteStoreError::Decode(e.to_string()))?;
        Ok(body.id)
    }

    async fn fetch_all(
        &self,
        owner_id: &str,
    ) -> Result<Vec<(RecordId, StoredRecord)>, RemoteStoreError> {
        let mut out = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = match self.fetch_page(owner_id, page_token.as_deref()).await {
                Ok(page) => page,
                // A failure after the first page is partial success, reported
                // distinctly from a total failure.
                Err(e) if !out.is_empty() => {
                    return Err(RemoteStoreError::PartialFetch {
                        retrieved: out.len(),
                        source: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            };
            out.extend(page.records.into_iter().map(|r| (r.id, r.record)));
            match page.next_page {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(out)
    }

    async fn delete(&self, owner_id: &str, id: &RecordId) -> Result<(), RemoteStoreError> {
        let url = format!("{}/{}", self.collection_url(owner_id), id);
        let res = self.authorize(self.client.delete(url)).send().await?;
        if res.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RemoteStoreError::NotFound(id.clone()));
        }
        if !res.status().is_success() {
            return Err(RemoteStoreError::Status(res.status()));
        }
        Ok(())
    }
}

/// In-memory store keyed by owner. Used by tests and offline runs; ids are
/// uuid v4, mirroring a document store's auto-assigned ids.
#[derive(Default)]
pub struct MemoryRemoteStore {
    collections: RwLock<HashMap<String, Vec<(RecordId, StoredRecord)>>>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn put(
        &self,
        owner_id: &str,
        record: &StoredRecord,
    ) -> Result<RecordId, RemoteStoreError> {
        let id = Uuid::new_v4().to_string();
        let mut collections = self.collections.write().await;
        collections
            .entry(owner_id.to_string())
            .or_default()
            .push((id.clone(), record.clone()));
        Ok(id)
    }

    async fn fetch_all(
        &self,
        owner_id: &str,
    ) -> Result<Vec<(RecordId, StoredRecord)>, RemoteStoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(owner_id).cloned().unwrap_or_default())
    }

    async fn delete(&self, owner_id: &str, id: &RecordId) -> Result<(), RemoteStoreError> {
        let mut collections = self.collections.write().await;
        let records = collections
            .get_mut(owner_id)
            .ok_or_else(|| RemoteStoreError::NotFound(id.clone()))?;
        let before = records.len();
        records.retain(|(record_id, _)| record_id != id);
        if records.len() == before {
            return Err(RemoteStoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str) -> StoredRecord {
        StoredRecord {
            username: name.to_string(),
            password: "b64-sealed".to_string(),
            url: "Work".to_string(),
        }
    }

    #[tokio::test]
    async fn put_assigns_distinct_ids() {
        let store = MemoryRemoteStore::new();
        let a = store.put("u1", &sample("Mail")).await.unwrap();
        let b = store.put("u1", &sample("Bank")).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.fetch_all("u1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn collections_are_owner_scoped() {
        let store = MemoryRemoteStore::new();
        store.put("u1", &sample("Mail")).await.unwrap();
        assert!(store.fetch_all("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_one_record() {
        let store = MemoryRemoteStore::new();
        let id = store.put("u1", &sample("Mail")).await.unwrap();
        store.put("u1", &sample("Bank")).await.unwrap();
        store.delete("u1", &id).await.unwrap();
        let remaining = store.fetch_all("u1").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].1.username, "Bank");
    }

    #[tokio::test]
    async fn delete_of_unknown_id_is_not_found() {
        let store = MemoryRemoteStore::new();
        store.put("u1", &sample("Mail")).await.unwrap();
        let err = store.delete("u1", &"missing".to_string()).await.unwrap_err();
        assert!(matches!(err, RemoteStoreError::NotFound(_)));
    }
}
