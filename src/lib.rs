//! Cachefy - A pluggable key/value cache
//!
//! Interchangeable TTL-bounded in-memory stores, a sharded router over them,
//! optional write-through persistence, and an asynchronous retrying
//! persistence queue.

pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod persistence;
pub mod repository;
pub mod serialization;

pub use builder::{build_cache, build_cache_with_repository};
pub use cache::{CacheBackend, ConcurrentStore, LockedStore, ShardedStore};
pub use config::{BackendKind, Config, DatabaseKind};
pub use error::{CacheError, Result};
pub use persistence::{AsyncPersistenceManager, PersistenceStats, PersistentCache};
pub use repository::{CacheEntry, InMemoryRepository, Repository, SqliteRepository};
#[cfg(feature = "postgres")]
pub use repository::PostgresRepository;
pub use serialization::{BincodeSerializer, JsonSerializer, Serializer, TypedCacheExt};
