//! Scriptable repository used by the persistence tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::error::{CacheError, Result};
use crate::repository::{CacheEntry, InMemoryRepository, Repository};

/// Wraps an [`InMemoryRepository`] with injectable `set` failures, an
/// optional gate that holds writes, and a log of successful writes.
#[derive(Debug, Default)]
pub(crate) struct ScriptedRepository {
    inner: InMemoryRepository,
    fail_next_sets: AtomicUsize,
    fail_all_sets: AtomicBool,
    set_attempts: AtomicUsize,
    written: Mutex<Vec<CacheEntry>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fails the next `n` calls to `set`.
    pub(crate) fn failing_first(n: usize) -> Self {
        let repo = Self::new();
        repo.fail_next_sets.store(n, Ordering::SeqCst);
        repo
    }

    /// Fails every call to `set`.
    pub(crate) fn always_failing() -> Self {
        let repo = Self::new();
        repo.fail_all_sets.store(true, Ordering::SeqCst);
        repo
    }

    /// Holds each `set` until a permit is added to `gate`.
    pub(crate) fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub(crate) fn set_attempts(&self) -> usize {
        self.set_attempts.load(Ordering::SeqCst)
    }

    /// Keys of successful writes in arrival order.
    pub(crate) fn written_keys(&self) -> Vec<String> {
        self.written
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.key.clone())
            .collect()
    }
}

#[async_trait]
impl Repository for ScriptedRepository {
    async fn get(&self, key: &str) -> Result<CacheEntry> {
        self.inner.get(key).await
    }

    async fn set(&self, entry: &CacheEntry) -> Result<()> {
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|_| CacheError::Persistence("gate closed".to_string()))?
                .forget();
        }

        self.set_attempts.fetch_add(1, Ordering::SeqCst);

        if self.fail_all_sets.load(Ordering::SeqCst) {
            return Err(CacheError::Persistence("database unavailable".to_string()));
        }
        let remaining = self.fail_next_sets.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next_sets.store(remaining - 1, Ordering::SeqCst);
            return Err(CacheError::Persistence("transient failure".to_string()));
        }

        self.inner.set(entry).await?;
        self.written.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key).await
    }

    async fn clear(&self) -> Result<()> {
        self.inner.clear().await
    }

    async fn paginate(&self, offset: usize, limit: usize) -> Result<Vec<CacheEntry>> {
        self.inner.paginate(offset, limit).await
    }
}
