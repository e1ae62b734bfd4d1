//! Async Persistence Manager
//!
//! Bounded queue drained by one background task that writes entries to a
//! repository with fixed-backoff retries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::persistence::stats::{PersistenceCounters, PersistenceStats};
use crate::repository::{CacheEntry, Repository};

// == Async Persistence Manager ==
/// Fire-and-forget durable writes.
///
/// `enqueue` waits while the queue is full rather than dropping work. One
/// worker drains the queue, so entries reach the repository in enqueue
/// order. An entry whose attempts are all exhausted is logged and
/// discarded; the producer is never told. The only trace is the `dropped`
/// counter in [`PersistenceStats`].
///
/// Must be created inside a Tokio runtime.
pub struct AsyncPersistenceManager {
    sender: Mutex<Option<mpsc::Sender<CacheEntry>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<PersistenceCounters>,
}

impl AsyncPersistenceManager {
    // == Constructor ==
    /// Starts the worker.
    ///
    /// # Arguments
    /// * `repo` - Destination of every queued entry
    /// * `queue_size` - Queue capacity (raised to 1 if zero)
    /// * `retry_limit` - Attempts per entry (raised to 1 if zero)
    /// * `retry_backoff` - Pause between failed attempts
    pub fn new(
        repo: Arc<dyn Repository>,
        queue_size: usize,
        retry_limit: usize,
        retry_backoff: Duration,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(queue_size.max(1));
        let counters = Arc::new(PersistenceCounters::default());

        let worker = Worker {
            repo,
            retry_limit: retry_limit.max(1),
            retry_backoff,
            counters: counters.clone(),
        };
        let handle = tokio::spawn(worker.run(receiver));

        info!(
            queue_size,
            retry_limit, "Async persistence worker started"
        );

        Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(handle)),
            counters,
        }
    }

    /// Starts the worker with the queue and retry settings of `config`.
    pub fn from_config(repo: Arc<dyn Repository>, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            repo,
            config.queue_size,
            config.retry_limit,
            config.retry_backoff,
        ))
    }

    // == Enqueue ==
    /// Queues an entry for persistence, waiting for room if the queue is full.
    ///
    /// Fails with [`CacheError::QueueClosed`] once shutdown has begun.
    pub async fn enqueue(&self, entry: CacheEntry) -> Result<()> {
        let sender = self
            .sender
            .lock()
            .await
            .clone()
            .ok_or(CacheError::QueueClosed)?;

        // Count before the entry becomes visible to the worker
        let permit = sender.reserve().await.map_err(|_| CacheError::QueueClosed)?;
        self.counters.record_enqueued();
        permit.send(entry);
        Ok(())
    }

    // == Shutdown ==
    /// Closes the queue and waits until every accepted entry has been
    /// persisted or dropped. In-flight retries run to completion.
    ///
    /// Concurrent callers all wait for the drain; calls after it has
    /// finished return immediately.
    pub async fn shutdown(&self) -> Result<()> {
        // Dropping the last sender lets the worker exit once the queue is empty
        self.sender.lock().await.take();

        // Held across the join so later callers wait for the same drain
        let mut worker = self.worker.lock().await;
        if let Some(handle) = worker.as_mut() {
            let joined = handle.await;
            *worker = None;
            joined?;
            info!("Async persistence worker drained and stopped");
        }
        Ok(())
    }

    /// Current outcome counters.
    pub fn stats(&self) -> PersistenceStats {
        self.counters.snapshot()
    }
}

// == Worker ==
struct Worker {
    repo: Arc<dyn Repository>,
    retry_limit: usize,
    retry_backoff: Duration,
    counters: Arc<PersistenceCounters>,
}

impl Worker {
    async fn run(self, mut receiver: mpsc::Receiver<CacheEntry>) {
        while let Some(entry) = receiver.recv().await {
            self.persist(entry).await;
        }
        debug!("Persistence queue closed and empty");
    }

    async fn persist(&self, entry: CacheEntry) {
        for attempt in 1..=self.retry_limit {
            match self.repo.set(&entry).await {
                Ok(()) => {
                    self.counters.record_persisted();
                    debug!(key = %entry.key, attempt, "Entry persisted");
                    return;
                }
                Err(err) => {
                    self.counters.record_failed_attempt();
                    warn!(
                        key = %entry.key,
                        attempt,
                        retry_limit = self.retry_limit,
                        error = %err,
                        "Persistence attempt failed"
                    );
                    if attempt < self.retry_limit {
                        tokio::time::sleep(self.retry_backoff).await;
                    }
                }
            }
        }

        self.counters.record_dropped();
        error!(
            key = %entry.key,
            attempts = self.retry_limit,
            "Retries exhausted, dropping entry"
        );
    }
}
