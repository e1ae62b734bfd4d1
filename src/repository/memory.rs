//! In-memory repository backed by an ordered map.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{CacheError, Result};
use crate::repository::{unix_now, CacheEntry, Repository};

/// Repository that keeps records in a `BTreeMap`, so pagination follows
/// key order like the SQL backends.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    records: RwLock<BTreeMap<String, CacheEntry>>,
}

impl InMemoryRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, expired ones included.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true when no records are stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get(&self, key: &str) -> Result<CacheEntry> {
        let now = unix_now();
        {
            let records = self.records.read().await;
            match records.get(key) {
                None => return Err(CacheError::Miss(key.to_string())),
                Some(entry) if !entry.is_expired_at(now) => return Ok(entry.clone()),
                Some(_) => {}
            }
        }

        // Expired records are dropped when read
        let mut records = self.records.write().await;
        if records.get(key).is_some_and(|entry| entry.is_expired_at(now)) {
            records.remove(key);
        }
        Err(CacheError::Miss(key.to_string()))
    }

    async fn set(&self, entry: &CacheEntry) -> Result<()> {
        self.records
            .write()
            .await
            .insert(entry.key.clone(), entry.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.records.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.records.write().await.clear();
        Ok(())
    }

    async fn paginate(&self, offset: usize, limit: usize) -> Result<Vec<CacheEntry>> {
        let records = self.records.read().await;
        Ok(records.values().skip(offset).take(limit).cloned().collect())
    }
}
