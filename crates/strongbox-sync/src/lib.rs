//! strongbox-sync — remote persistence and credential flows
//!
//! The remote document store only ever sees sealed records; plaintext exists
//! in this crate solely between a fetch and the caller.
//!
//! # Module layout
//! - `remote`   — opaque per-owner record store (HTTP client + in-memory fake)
//! - `service`  — save/load/delete/filter flows with optimistic-write reconciliation
//! - `autofill` — decrypted credential lookup for the platform autofill provider
//! - `config`   — remote endpoint + owner configuration file
//! - `paths`    — platform config/data directories
//! - `error`    — store and service error types

pub mod autofill;
pub mod config;
pub mod error;
pub mod paths;
pub mod remote;
pub mod service;

pub use error::{RemoteStoreError, SyncError};
