//! Concurrent Store Module
//!
//! Entry store backed by a `DashMap`, synchronized per bucket.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::cache::{CacheBackend, StoredValue};
use crate::error::{CacheError, Result};

// == Concurrent Store ==
/// TTL-bounded table with striped locking.
///
/// Writers to different buckets never contend. Expired entries observed by
/// `get` are removed on the spot; nothing else sweeps them.
///
/// Per-key operations share `clear_gate`; `clear` takes it exclusively so the
/// whole table empties as one step with respect to other calls.
#[derive(Debug)]
pub struct ConcurrentStore {
    entries: DashMap<String, StoredValue>,
    clear_gate: RwLock<()>,
    default_ttl: Duration,
}

impl ConcurrentStore {
    // == Constructor ==
    /// Creates an empty store whose writes live for `default_ttl`.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            clear_gate: RwLock::new(()),
            default_ttl,
        }
    }

    // == Length ==
    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no entries are stored, expired ones included.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheBackend for ConcurrentStore {
    async fn get(&self, key: &str) -> Result<Bytes> {
        let _gate = self.clear_gate.read().await;

        let live = match self.entries.get(key) {
            Some(stored) => stored.live_value(),
            None => return Err(CacheError::Miss(key.to_string())),
        };

        match live {
            Some(value) => Ok(value),
            None => {
                // Re-check under the bucket lock so a concurrent overwrite survives
                self.entries.remove_if(key, |_, stored| stored.is_expired());
                Err(CacheError::Miss(key.to_string()))
            }
        }
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        let _gate = self.clear_gate.read().await;
        self.entries
            .insert(key.to_string(), StoredValue::new(value, self.default_ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let _gate = self.clear_gate.read().await;
        self.entries.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let _gate = self.clear_gate.write().await;
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = ConcurrentStore::new(Duration::from_secs(300));

        store.set("key1", Bytes::from("value1")).await.unwrap();
        assert_eq!(store.get("key1").await.unwrap(), Bytes::from("value1"));

        store.delete("key1").await.unwrap();
        assert!(store.get("key1").await.unwrap_err().is_miss());
        assert!(store.delete("key1").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_removed_on_read() {
        let store = ConcurrentStore::new(Duration::from_secs(1));

        store.set("key1", Bytes::from("value1")).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.len(), 1);

        let err = store.get("key1").await.unwrap_err();
        assert!(matches!(err, CacheError::Miss(_)));
        assert!(store.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_clear_during_concurrent_writes() {
        const WRITES: usize = 2000;

        for _ in 0..20 {
            let store = Arc::new(ConcurrentStore::new(Duration::from_secs(300)));

            let writer = {
                let store = store.clone();
                tokio::spawn(async move {
                    for i in 0..WRITES {
                        store
                            .set(&format!("key_{}", i), Bytes::from("v"))
                            .await
                            .unwrap();
                    }
                })
            };
            tokio::task::yield_now().await;
            store.clear().await.unwrap();
            writer.await.unwrap();

            // Clear lands between two sequential writes: everything before it
            // is gone and everything after it survives.
            let mut survivors = Vec::new();
            for i in 0..WRITES {
                if store.get(&format!("key_{}", i)).await.is_ok() {
                    survivors.push(i);
                }
            }
            let first = survivors.first().copied().unwrap_or(WRITES);
            assert_eq!(survivors, (first..WRITES).collect::<Vec<_>>());
            assert_eq!(store.len(), WRITES - first);
        }
    }
}
