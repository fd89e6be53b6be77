use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use top500_core::{Record, SystemId};

use crate::{ShardStore, StoreError};

/// Process-local store, used when no Redis URL is configured.
#[derive(Default)]
pub struct MemoryStore {
    processed: Mutex<HashSet<SystemId>>,
    records: Mutex<HashMap<SystemId, Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn processed_count(&self) -> usize {
        self.processed.lock().map(|p| p.len()).unwrap_or(0)
    }
}

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    m.lock()
        .map_err(|_| StoreError::Other("memory store lock poisoned".into()))
}

#[async_trait]
impl ShardStore for MemoryStore {
    async fn is_processed(&self, id: SystemId) -> Result<bool, StoreError> {
        Ok(lock(&self.processed)?.contains(&id))
    }

    async fn mark_processed(&self, id: SystemId) -> Result<(), StoreError> {
        lock(&self.processed)?.insert(id);
        Ok(())
    }

    async fn cached_record(&self, id: SystemId) -> Result<Option<Record>, StoreError> {
        Ok(lock(&self.records)?.get(&id).cloned())
    }

    async fn cache_record(&self, record: &Record) -> Result<(), StoreError> {
        lock(&self.records)?.insert(record.id, record.clone());
        Ok(())
    }
}
