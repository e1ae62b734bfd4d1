//! Configuration Module
//!
//! Handles loading, parsing and validating cache configuration.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

// == Backend Kind ==
/// In-memory storage strategy selected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// One table behind a single reader/writer lock
    Locked,
    /// One concurrent map with per-bucket synchronization
    Concurrent,
    /// Many locked tables, routed by key hash
    Sharded,
}

impl FromStr for BackendKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rwmutex" | "locked" => Ok(BackendKind::Locked),
            "syncmap" | "concurrent" => Ok(BackendKind::Concurrent),
            "sharded" => Ok(BackendKind::Sharded),
            other => Err(CacheError::Validation(format!(
                "unsupported backend: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Locked => "rwmutex",
            BackendKind::Concurrent => "syncmap",
            BackendKind::Sharded => "sharded",
        };
        f.write_str(name)
    }
}

// == Database Kind ==
/// Durable store family used when persistence is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    Sqlite,
    Postgres,
}

impl FromStr for DatabaseKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(DatabaseKind::Sqlite),
            "postgres" | "postgresql" => Ok(DatabaseKind::Postgres),
            other => Err(CacheError::Validation(format!(
                "unsupported database type: {}",
                other
            ))),
        }
    }
}

// == Config ==
/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Time-to-live applied to every in-memory write
    pub default_ttl: Duration,
    /// In-memory storage strategy
    pub backend: BackendKind,
    /// Number of shards (sharded backend only)
    pub shards: usize,
    /// Per-shard capacity. Advisory: accepted and exposed, never enforced.
    pub shard_capacity: usize,
    /// Wrap the backend in a write-through persistent cache
    pub enable_persistence: bool,
    /// Durable store family
    pub database_kind: DatabaseKind,
    /// Opaque connection string handed to the durable store
    pub database_dsn: String,
    /// Capacity of the async persistence queue
    pub queue_size: usize,
    /// Maximum durable write attempts per queued entry
    pub retry_limit: usize,
    /// Pause between failed durable write attempts
    pub retry_backoff: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `CACHE_BACKEND` - `rwmutex`, `syncmap` or `sharded` (default: rwmutex)
    /// - `CACHE_SHARDS` - Shard count (default: 16)
    /// - `CACHE_SHARD_CAPACITY` - Advisory per-shard capacity (default: 1024)
    /// - `CACHE_ENABLE_PERSISTENCE` - `true`/`false` (default: false)
    /// - `CACHE_DATABASE_TYPE` - `sqlite` or `postgres` (default: sqlite)
    /// - `CACHE_DATABASE_DSN` - Connection string (default: `:memory:`)
    /// - `CACHE_QUEUE_SIZE` - Async persistence queue capacity (default: 1024)
    /// - `CACHE_RETRY_LIMIT` - Async persistence attempts (default: 3)
    /// - `CACHE_RETRY_BACKOFF_MS` - Pause between attempts (default: 2000)
    ///
    /// Numeric values that fail to parse fall back to their default. Unknown
    /// backend or database names are rejected.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let backend = match env::var("CACHE_BACKEND") {
            Ok(name) => name.parse()?,
            Err(_) => defaults.backend,
        };
        let database_kind = match env::var("CACHE_DATABASE_TYPE") {
            Ok(name) => name.parse()?,
            Err(_) => defaults.database_kind,
        };

        Ok(Self {
            default_ttl: env_parsed::<u64>("CACHE_DEFAULT_TTL")
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_ttl),
            backend,
            shards: env_parsed("CACHE_SHARDS").unwrap_or(defaults.shards),
            shard_capacity: env_parsed("CACHE_SHARD_CAPACITY").unwrap_or(defaults.shard_capacity),
            enable_persistence: env_parsed("CACHE_ENABLE_PERSISTENCE")
                .unwrap_or(defaults.enable_persistence),
            database_kind,
            database_dsn: env::var("CACHE_DATABASE_DSN").unwrap_or(defaults.database_dsn),
            queue_size: env_parsed("CACHE_QUEUE_SIZE").unwrap_or(defaults.queue_size),
            retry_limit: env_parsed("CACHE_RETRY_LIMIT").unwrap_or(defaults.retry_limit),
            retry_backoff: env_parsed::<u64>("CACHE_RETRY_BACKOFF_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_backoff),
        })
    }

    // == Validate ==
    /// Rejects configurations that cannot produce a usable cache.
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl.is_zero() {
            return Err(CacheError::Validation(
                "defaultTTL must be greater than zero".to_string(),
            ));
        }

        if self.backend == BackendKind::Sharded && (self.shards == 0 || self.shard_capacity == 0) {
            return Err(CacheError::Validation(
                "shards and shardCapacity must be greater than zero".to_string(),
            ));
        }

        if self.queue_size == 0 {
            return Err(CacheError::Validation(
                "queueSize must be greater than zero".to_string(),
            ));
        }

        if self.retry_limit == 0 {
            return Err(CacheError::Validation(
                "retryLimit must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
            backend: BackendKind::Locked,
            shards: 16,
            shard_capacity: 1024,
            enable_persistence: false,
            database_kind: DatabaseKind::Sqlite,
            database_dsn: ":memory:".to_string(),
            queue_size: 1024,
            retry_limit: 3,
            retry_backoff: Duration::from_secs(2),
        }
    }
}

fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
