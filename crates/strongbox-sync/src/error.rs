use strongbox_core::{KeyStoreError, MapperError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteStoreError {
    #[error("remote request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote store rejected the request with status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response from remote store: {0}")]
    Decode(String),

    #[error("fetch interrupted after {retrieved} records: {source}")]
    PartialFetch {
        retrieved: usize,
        #[source]
        source: Box<RemoteStoreError>,
    },

    #[error("record not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("key store error: {0}")]
    KeyStore(#[from] KeyStoreError),

    #[error("record mapping error: {0}")]
    Mapper(#[from] MapperError),

    #[error("remote store error: {0}")]
    Remote(#[from] RemoteStoreError),
}
