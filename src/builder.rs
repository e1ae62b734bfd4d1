//! Cache Builder
//!
//! Turns a validated [`Config`] into a ready cache.

use std::sync::Arc;

use tracing::{error, info};

use crate::cache::{CacheBackend, ConcurrentStore, LockedStore, ShardedStore};
use crate::config::{BackendKind, Config, DatabaseKind};
use crate::error::Result;
use crate::persistence::PersistentCache;
#[cfg(feature = "postgres")]
use crate::repository::PostgresRepository;
use crate::repository::{Repository, SqliteRepository};

/// Builds the configured cache.
///
/// With `enable_persistence` the in-memory backend is wrapped in a
/// [`PersistentCache`] over the built-in repository for `database_kind`,
/// opened with `database_dsn`. Postgres needs the `postgres` feature
/// (on by default).
///
/// Invalid configurations fail before anything is allocated.
pub async fn build_cache(config: &Config) -> Result<Arc<dyn CacheBackend>> {
    config.validate()?;

    let cache = build_backend(config);
    if !config.enable_persistence {
        info!(backend = %config.backend, "Cache successfully initialized");
        return Ok(cache);
    }

    let repo = open_repository(config).await.inspect_err(|err| {
        error!(error = %err, "Failed to initialize persistence repository");
    })?;
    info!(backend = %config.backend, "Persistence layer enabled");

    Ok(Arc::new(PersistentCache::new(cache, repo)))
}

/// Builds the configured in-memory backend wrapped in a [`PersistentCache`]
/// over a caller-supplied repository. `enable_persistence` and the database
/// settings are ignored.
pub fn build_cache_with_repository(
    config: &Config,
    repo: Arc<dyn Repository>,
) -> Result<Arc<dyn CacheBackend>> {
    config.validate()?;

    let cache = build_backend(config);
    info!(backend = %config.backend, "Persistence layer enabled with supplied repository");

    Ok(Arc::new(PersistentCache::new(cache, repo)))
}

fn build_backend(config: &Config) -> Arc<dyn CacheBackend> {
    match config.backend {
        BackendKind::Locked => Arc::new(LockedStore::new(config.default_ttl)),
        BackendKind::Concurrent => Arc::new(ConcurrentStore::new(config.default_ttl)),
        BackendKind::Sharded => Arc::new(ShardedStore::new(
            config.shards,
            config.default_ttl,
            config.shard_capacity,
        )),
    }
}

async fn open_repository(config: &Config) -> Result<Arc<dyn Repository>> {
    match config.database_kind {
        DatabaseKind::Sqlite => Ok(Arc::new(SqliteRepository::open(&config.database_dsn)?)),
        #[cfg(feature = "postgres")]
        DatabaseKind::Postgres => Ok(Arc::new(
            PostgresRepository::connect(&config.database_dsn).await?,
        )),
        #[cfg(not(feature = "postgres"))]
        DatabaseKind::Postgres => Err(crate::error::CacheError::Validation(
            "built without the postgres feature".to_string(),
        )),
    }
}
