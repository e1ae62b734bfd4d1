//! Persistence Statistics Module
//!
//! Counts outcomes of the async persistence worker.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Persistence Stats ==
/// Snapshot of async persistence outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PersistenceStats {
    /// Entries accepted into the queue
    pub enqueued: u64,
    /// Entries written to the repository
    pub persisted: u64,
    /// Individual write attempts that failed
    pub failed_attempts: u64,
    /// Entries discarded after exhausting their retries
    pub dropped: u64,
}

impl PersistenceStats {
    /// Fraction of finished entries that were persisted.
    ///
    /// Returns 0.0 if nothing has finished yet.
    pub fn success_rate(&self) -> f64 {
        let finished = self.persisted + self.dropped;
        if finished == 0 {
            0.0
        } else {
            self.persisted as f64 / finished as f64
        }
    }

    /// Entries accepted but not yet persisted or dropped.
    pub fn pending(&self) -> u64 {
        self.enqueued.saturating_sub(self.persisted + self.dropped)
    }
}

// == Counters ==
/// Lock-free counters shared between producers and the worker.
#[derive(Debug, Default)]
pub(crate) struct PersistenceCounters {
    enqueued: AtomicU64,
    persisted: AtomicU64,
    failed_attempts: AtomicU64,
    dropped: AtomicU64,
}

impl PersistenceCounters {
    pub(crate) fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_persisted(&self) {
        self.persisted.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_failed_attempt(&self) {
        self.failed_attempts.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }

    /// Reads finished counts before `enqueued`, so a snapshot never shows
    /// more finished entries than accepted ones.
    pub(crate) fn snapshot(&self) -> PersistenceStats {
        let dropped = self.dropped.load(Ordering::SeqCst);
        let persisted = self.persisted.load(Ordering::SeqCst);
        let failed_attempts = self.failed_attempts.load(Ordering::SeqCst);
        let enqueued = self.enqueued.load(Ordering::SeqCst);

        PersistenceStats {
            enqueued,
            persisted,
            failed_attempts,
            dropped,
        }
    }
}
