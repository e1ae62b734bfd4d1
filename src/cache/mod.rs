//! Cache Module
//!
//! Provides the storage accessor contract and the in-memory backends that
//! implement it: a single-lock table, a concurrent map, and a sharded router.

mod concurrent;
mod entry;
mod locked;
mod sharded;


use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

// Re-export public types
pub use concurrent::ConcurrentStore;
pub use entry::StoredValue;
pub use locked::LockedStore;
pub use sharded::{shard_index, ShardedStore};

// == Storage Accessor ==
/// Get/Set/Delete/Clear over opaque values.
///
/// `get` reports absent, deleted and expired keys alike as
/// [`CacheError::Miss`](crate::error::CacheError::Miss). `delete` on an
/// absent key is a no-op.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Bytes>;

    async fn set(&self, key: &str, value: Bytes) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}
