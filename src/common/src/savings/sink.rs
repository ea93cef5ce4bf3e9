use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tokio::sync::RwLock;

use crate::error::SinkError;
use crate::types::savings::SavingsRecord;

/// Key-value store holding one savings record per (account, region).
#[automock]
#[async_trait]
pub trait SavingsSink: Send + Sync {
    async fn get(&self, account_id: &str, region: &str)
        -> Result<Option<SavingsRecord>, SinkError>;

    /// Conditional write. Succeeds only if the stored version equals
    /// `expected_version`, where `None` means "no record stored yet".
    /// Otherwise fails with [`SinkError::Conflict`].
    async fn put(
        &self,
        record: &SavingsRecord,
        expected_version: Option<u64>,
    ) -> Result<(), SinkError>;
}

#[async_trait]
impl<T: SavingsSink + ?Sized> SavingsSink for Arc<T> {
    async fn get(
        &self,
        account_id: &str,
        region: &str,
    ) -> Result<Option<SavingsRecord>, SinkError> {
        (**self).get(account_id, region).await
    }

    async fn put(
        &self,
        record: &SavingsRecord,
        expected_version: Option<u64>,
    ) -> Result<(), SinkError> {
        (**self).put(record, expected_version).await
    }
}

/// Process-local sink, used for dry runs and tests.
#[derive(Debug, Default)]
pub struct InMemorySink {
    records: RwLock<HashMap<(String, String), SavingsRecord>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl SavingsSink for InMemorySink {
    async fn get(
        &self,
        account_id: &str,
        region: &str,
    ) -> Result<Option<SavingsRecord>, SinkError> {
        let records = self.records.read().await;
        Ok(records
            .get(&(account_id.to_string(), region.to_string()))
            .cloned())
    }

    async fn put(
        &self,
        record: &SavingsRecord,
        expected_version: Option<u64>,
    ) -> Result<(), SinkError> {
        let key = (record.account_id.clone(), record.region.clone());
        let mut records = self.records.write().await;

        let stored_version = records.get(&key).map(|r| r.version);
        if stored_version != expected_version {
            return Err(SinkError::Conflict {
                account_id: record.account_id.clone(),
                region: record.region.clone(),
            });
        }

        records.insert(key, record.clone());
        Ok(())
    }
}
