//! Repository Module
//!
//! Durable storage contract and the record shape it persists.
//!
//! # Backends
//! - `InMemoryRepository`: ordered map, for tests and ephemeral deployments
//! - `SqliteRepository`: single SQLite table via rusqlite
//! - `PostgresRepository`: same table via tokio-postgres (`postgres` feature)

mod memory;
#[cfg(feature = "postgres")]
mod postgres;
mod record;
mod sqlite;

use async_trait::async_trait;

use crate::error::Result;

pub use memory::InMemoryRepository;
#[cfg(feature = "postgres")]
pub use postgres::PostgresRepository;
pub use record::{unix_now, CacheEntry, NO_EXPIRY};
pub use sqlite::SqliteRepository;

// == Repository Accessor ==
/// Get/Set/Delete/Clear/Paginate against durable storage.
///
/// Implementations must be safe to call from many tasks at once.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Fetches a live record. Absent records and records past a positive
    /// `expires_at` are reported as [`CacheError::Miss`](crate::error::CacheError::Miss).
    async fn get(&self, key: &str) -> Result<CacheEntry>;

    /// Inserts or replaces the record for `entry.key`.
    async fn set(&self, entry: &CacheEntry) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;

    /// Returns up to `limit` records in ascending key order, skipping `offset`.
    async fn paginate(&self, offset: usize, limit: usize) -> Result<Vec<CacheEntry>>;
}
