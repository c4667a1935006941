use crate::app::ports::DocumentStorePort;
use crate::error::{RegistryError, Result};
use crate::types::StoredRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// In-memory document store for development/testing
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    records: Arc<Mutex<BTreeMap<String, StoredRecord>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<MutexGuard<'_, BTreeMap<String, StoredRecord>>> {
        self.records.lock().map_err(|e| RegistryError::Storage {
            message: format!("document store lock poisoned: {e}"),
        })
    }
}

#[async_trait]
impl DocumentStorePort for InMemoryDocumentStore {
    async fn get(&self, key: &str) -> Result<Option<StoredRecord>> {
        Ok(self.records()?.get(key).cloned())
    }

    async fn put(&self, key: &str, record: &StoredRecord) -> Result<()> {
        self.records()?.insert(key.to_string(), record.clone());
        debug!("Stored record {}", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let removed = self.records()?.remove(key).is_some();
        debug!("Deleted record {} (existed: {})", key, removed);
        Ok(removed)
    }

    async fn list_keys(&self, cutoff: Option<DateTime<Utc>>) -> Result<Vec<String>> {
        let records = self.records()?;
        Ok(records
            .iter()
            .filter(|(_, r)| cutoff.map_or(true, |cutoff| r.updated_at <= cutoff))
            .map(|(k, _)| k.clone())
            .collect())
    }
}
