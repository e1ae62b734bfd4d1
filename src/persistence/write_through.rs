//! Write-Through Persistent Cache
//!
//! Pairs an in-memory backend with a repository and applies every mutation
//! to both, in-memory first.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::warn;

use crate::cache::CacheBackend;
use crate::error::Result;
use crate::repository::{CacheEntry, Repository};

// == Persistent Cache ==
/// Write-through wrapper over any [`CacheBackend`] and [`Repository`].
///
/// All mutations run inside one exclusive section per wrapper: the
/// in-memory change, then the durable one. If the durable step fails the
/// error is returned but the in-memory change stays applied; callers must
/// treat the two stores as briefly divergent in that case.
///
/// `get` reads only the in-memory layer and never falls back to the
/// repository, so a cold cache is not rehydrated. Durable records are
/// written without an expiry (`NO_EXPIRY`); the in-memory TTL is not
/// mirrored.
pub struct PersistentCache {
    cache: Arc<dyn CacheBackend>,
    repo: Arc<dyn Repository>,
    write_lock: Mutex<()>,
}

impl PersistentCache {
    // == Constructor ==
    pub fn new(cache: Arc<dyn CacheBackend>, repo: Arc<dyn Repository>) -> Self {
        Self {
            cache,
            repo,
            write_lock: Mutex::new(()),
        }
    }

    /// The wrapped in-memory backend.
    pub fn cache(&self) -> &Arc<dyn CacheBackend> {
        &self.cache
    }

    /// The wrapped repository.
    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repo
    }
}

#[async_trait]
impl CacheBackend for PersistentCache {
    async fn get(&self, key: &str) -> Result<Bytes> {
        self.cache.get(key).await
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        self.cache.set(key, value.clone()).await?;

        let entry = CacheEntry::without_expiry(key, value);
        self.repo.set(&entry).await.inspect_err(|err| {
            warn!(key, error = %err, "Durable write failed after in-memory set");
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        self.cache.delete(key).await?;
        self.repo.delete(key).await.inspect_err(|err| {
            warn!(key, error = %err, "Durable delete failed after in-memory delete");
        })
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        self.cache.clear().await?;
        self.repo.clear().await.inspect_err(|err| {
            warn!(error = %err, "Durable clear failed after in-memory clear");
        })
    }
}
