//! Credential lookup for the platform autofill provider.
//!
//! The provider resolves secrets through the same mapper/open path as the
//! main app; there is no second decryption path, and records that failed
//! authentication are never offered for fill.

use strongbox_core::record::SecretValue;

use crate::error::SyncError;
use crate::service::{CredentialService, VaultEntry};

/// A decrypted credential handed to the autofill consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillCredential {
    pub name: String,
    pub secret: String,
}

pub struct AutofillGateway<'a> {
    service: &'a CredentialService,
}

impl<'a> AutofillGateway<'a> {
    pub fn new(service: &'a CredentialService) -> Self {
        Self { service }
    }

    /// Resolve a credential for a service identifier: exact category match
    /// first, then case-insensitive name containment. Undecryptable records
    /// are skipped.
    pub async fn credential_for_service(
        &self,
        service_id: &str,
    ) -> Result<Option<FillCredential>, SyncError> {
        let entries = self.service.load_all().await?;
        let readable: Vec<(&VaultEntry, &str)> = entries
            .iter()
            .filter_map(|e| match &e.record.secret {
                SecretValue::Plain(secret) => Some((e, secret.as_str())),
                SecretValue::Undecryptable => None,
            })
            .collect();

        let needle = service_id.to_lowercase();
        let matched = readable
            .iter()
            .find(|(e, _)| e.record.category == service_id)
            .or_else(|| {
                readable
                    .iter()
                    .find(|(e, _)| e.record.name.to_lowercase().contains(&needle))
            });

        Ok(matched.map(|(entry, secret)| FillCredential {
            name: entry.record.name.clone(),
            secret: (*secret).to_string(),
        }))
    }
}
