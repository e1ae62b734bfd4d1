//! Locked Store Module
//!
//! Entry store backed by one HashMap behind a single reader/writer lock.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::cache::{CacheBackend, StoredValue};
use crate::error::{CacheError, Result};

// == Locked Store ==
/// TTL-bounded table guarded by a `tokio::sync::RwLock`.
///
/// Reads share the lock; `set`, `delete` and `clear` each take it
/// exclusively, so a reader never sees a half-written entry. Expired entries
/// are only detected on read and stay in the table until overwritten,
/// deleted or cleared.
#[derive(Debug)]
pub struct LockedStore {
    /// Key-value storage
    entries: RwLock<HashMap<String, StoredValue>>,
    /// TTL applied to every write
    default_ttl: Duration,
}

impl LockedStore {
    // == Constructor ==
    /// Creates an empty store whose writes live for `default_ttl`.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Returns the TTL applied to every write.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Length ==
    /// Returns the number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Holds the table lock exclusively until the guard drops.
    #[cfg(test)]
    pub(crate) async fn lock_exclusive(
        &self,
    ) -> tokio::sync::RwLockWriteGuard<'_, HashMap<String, StoredValue>> {
        self.entries.write().await
    }
}

#[async_trait]
impl CacheBackend for LockedStore {
    async fn get(&self, key: &str) -> Result<Bytes> {
        let entries = self.entries.read().await;

        entries
            .get(key)
            .and_then(StoredValue::live_value)
            .ok_or_else(|| CacheError::Miss(key.to_string()))
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        let stored = StoredValue::new(value, self.default_ttl);
        self.entries.write().await.insert(key.to_string(), stored);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        // Swap in a fresh table under one exclusive section
        *self.entries.write().await = HashMap::new();
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn store() -> LockedStore {
        LockedStore::new(Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_store_set_and_get() {
        let store = store();

        store.set("key1", Bytes::from("value1")).await.unwrap();
        let value = store.get("key1").await.unwrap();

        assert_eq!(value, Bytes::from("value1"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_get_nonexistent() {
        let store = store();

        let result = store.get("nonexistent").await;
        assert!(matches!(result, Err(CacheError::Miss(_))));
    }

    #[tokio::test]
    async fn test_store_overwrite() {
        let store = store();

        store.set("key1", Bytes::from("value1")).await.unwrap();
        store.set("key1", Bytes::from("value2")).await.unwrap();

        assert_eq!(store.get("key1").await.unwrap(), Bytes::from("value2"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_delete_absent_is_noop() {
        let store = store();

        assert!(store.delete("nonexistent").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_refreshes_deadline() {
        let store = LockedStore::new(Duration::from_secs(10));

        store.set("key1", Bytes::from("old")).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        store.set("key1", Bytes::from("new")).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(store.get("key1").await.unwrap(), Bytes::from("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_stays_stored() {
        let store = LockedStore::new(Duration::from_secs(1));

        store.set("key1", Bytes::from("value1")).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        assert!(store.get("key1").await.unwrap_err().is_miss());
        // No sweep: the stale entry occupies storage until cleared
        assert_eq!(store.len().await, 1);

        store.clear().await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_writers_and_readers() {
        let store = Arc::new(store());

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for j in 0..50 {
                    let key = format!("key_{}_{}", i, j);
                    store.set(&key, Bytes::from(key.clone())).await.unwrap();
                    assert_eq!(store.get(&key).await.unwrap(), Bytes::from(key));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len().await, 16 * 50);
    }
}
