//! Sharded Store Module
//!
//! Routes each key to one of N independently locked stores.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};
use xxhash_rust::xxh32::xxh32;

use crate::cache::{CacheBackend, LockedStore};
use crate::error::Result;

/// Seed for shard hashing. Fixed so routing is identical across instances.
const SHARD_HASH_SEED: u32 = 0;

// == Shard Index ==
/// Maps a key onto `[0, shard_count)` with a 32-bit xxHash.
///
/// `shard_count` must be non-zero.
pub fn shard_index(key: &str, shard_count: usize) -> usize {
    xxh32(key.as_bytes(), SHARD_HASH_SEED) as usize % shard_count
}

// == Sharded Store ==
/// A fixed array of [`LockedStore`]s addressed by key hash.
///
/// Keys on different shards never share a lock. `clear` empties the shards
/// one after another, so it is not atomic across the whole router: a
/// concurrent `get` may still see data in a shard that has not been reached
/// yet.
#[derive(Debug)]
pub struct ShardedStore {
    shards: Vec<LockedStore>,
    /// Advisory only; no shard is bounded by it.
    shard_capacity: usize,
}

impl ShardedStore {
    // == Constructor ==
    /// Creates `shard_count` empty shards sharing one default TTL.
    ///
    /// A zero `shard_count` is raised to one; use
    /// [`Config::validate`](crate::config::Config::validate) to reject it
    /// up front.
    pub fn new(shard_count: usize, default_ttl: Duration, shard_capacity: usize) -> Self {
        let shard_count = shard_count.max(1);
        let shards = (0..shard_count)
            .map(|_| LockedStore::new(default_ttl))
            .collect();

        info!(
            shard_count,
            shard_capacity, "Sharded store created (shard capacity is advisory)"
        );

        Self {
            shards,
            shard_capacity,
        }
    }

    /// Number of shards, fixed for the lifetime of the store.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// The configured per-shard capacity. Not enforced.
    pub fn shard_capacity(&self) -> usize {
        self.shard_capacity
    }

    /// Index of the shard that owns `key`.
    pub fn shard_for(&self, key: &str) -> usize {
        shard_index(key, self.shards.len())
    }

    /// Entries held per shard, expired ones included.
    pub async fn shard_lengths(&self) -> Vec<usize> {
        let mut lengths = Vec::with_capacity(self.shards.len());
        for shard in &self.shards {
            lengths.push(shard.len().await);
        }
        lengths
    }

    fn shard(&self, key: &str) -> &LockedStore {
        let index = self.shard_for(key);
        debug!(key, index, "Routing key to shard");
        &self.shards[index]
    }

    #[cfg(test)]
    pub(crate) fn shard_at(&self, index: usize) -> &LockedStore {
        &self.shards[index]
    }
}

#[async_trait]
impl CacheBackend for ShardedStore {
    async fn get(&self, key: &str) -> Result<Bytes> {
        self.shard(key).get(key).await
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        self.shard(key).set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.shard(key).delete(key).await
    }

    async fn clear(&self) -> Result<()> {
        for shard in &self.shards {
            shard.clear().await?;
        }
        Ok(())
    }
}
