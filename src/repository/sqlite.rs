//! SQLite repository.
//!
//! One `cache` table keyed by the cache key. Calls run on the blocking pool
//! against a single shared connection.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::error::{CacheError, Result};
use crate::repository::{unix_now, CacheEntry, Repository};

// == SQL Statements ==
const SQL_CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS cache (
        key TEXT PRIMARY KEY,
        value BLOB,
        expires_at INTEGER
    )";

const SQL_GET_ENTRY: &str = "SELECT value, expires_at FROM cache WHERE key = ?1";

const SQL_UPSERT_ENTRY: &str = "
    INSERT INTO cache (key, value, expires_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        expires_at = excluded.expires_at";

const SQL_DELETE_ENTRY: &str = "DELETE FROM cache WHERE key = ?1";

const SQL_CLEAR_ENTRIES: &str = "DELETE FROM cache";

const SQL_PAGINATE_ENTRIES: &str = "
    SELECT key, value, expires_at FROM cache
    ORDER BY key ASC LIMIT ?1 OFFSET ?2";

// == SQLite Repository ==
/// Repository persisting records to a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRepository {
    /// Opens (or creates) the database at `path` and ensures the table exists.
    ///
    /// `":memory:"` opens a private in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.execute(SQL_CREATE_TABLE, [])?;
        info!(path = %path.display(), "SQLite repository ready");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Runs `f` with the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| CacheError::Persistence("sqlite connection lock poisoned".to_string()))?;
            f(&guard)
        })
        .await?
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn get(&self, key: &str) -> Result<CacheEntry> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let row = conn
                .query_row(SQL_GET_ENTRY, params![key], |row| {
                    Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, i64>(1)?))
                })
                .optional()?;

            let Some((value, expires_at)) = row else {
                return Err(CacheError::Miss(key));
            };

            let entry = CacheEntry::new(key, Bytes::from(value), expires_at);
            if entry.is_expired_at(unix_now()) {
                conn.execute(SQL_DELETE_ENTRY, params![entry.key])?;
                return Err(CacheError::Miss(entry.key));
            }
            Ok(entry)
        })
        .await
    }

    async fn set(&self, entry: &CacheEntry) -> Result<()> {
        let entry = entry.clone();
        self.with_conn(move |conn| {
            conn.execute(
                SQL_UPSERT_ENTRY,
                params![entry.key, &entry.value[..], entry.expires_at],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            conn.execute(SQL_DELETE_ENTRY, params![key])?;
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(SQL_CLEAR_ENTRIES, [])?;
            Ok(())
        })
        .await
    }

    async fn paginate(&self, offset: usize, limit: usize) -> Result<Vec<CacheEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(SQL_PAGINATE_ENTRIES)?;
            let rows = stmt.query_map(params![limit, offset], |row| {
                Ok(CacheEntry::new(
                    row.get::<_, String>(0)?,
                    Bytes::from(row.get::<_, Vec<u8>>(1)?),
                    row.get::<_, i64>(2)?,
                ))
            })?;

            let mut entries = Vec::new();
            for entry in rows {
                entries.push(entry?);
            }
            Ok(entries)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let repo = SqliteRepository::open_in_memory().unwrap();

        let entry = CacheEntry::with_ttl("key1", "value1", std::time::Duration::from_secs(300));
        repo.set(&entry).await.unwrap();

        let retrieved = repo.get("key1").await.unwrap();
        assert_eq!(retrieved, entry);
    }

    #[tokio::test]
    async fn test_get_missing_is_miss() {
        let repo = SqliteRepository::open_in_memory().unwrap();

        let err = repo.get("nope").await.unwrap_err();
        assert!(err.is_miss());
    }

    #[tokio::test]
    async fn test_upsert_replaces_value() {
        let repo = SqliteRepository::open_in_memory().unwrap();

        repo.set(&CacheEntry::without_expiry("key1", "v1")).await.unwrap();
        repo.set(&CacheEntry::without_expiry("key1", "v2")).await.unwrap();

        assert_eq!(&repo.get("key1").await.unwrap().value[..], b"v2");
        assert_eq!(repo.paginate(0, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_expiry_marker_is_live() {
        let repo = SqliteRepository::open_in_memory().unwrap();

        repo.set(&CacheEntry::without_expiry("key1", "v")).await.unwrap();

        assert!(repo.get("key1").await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_record_deleted_on_read() {
        let repo = SqliteRepository::open_in_memory().unwrap();

        repo.set(&CacheEntry::new("old", "v", unix_now() - 60))
            .await
            .unwrap();

        assert!(repo.get("old").await.unwrap_err().is_miss());
        assert!(repo.paginate(0, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        for key in ["a", "b", "c"] {
            repo.set(&CacheEntry::without_expiry(key, "v")).await.unwrap();
        }

        repo.delete("b").await.unwrap();
        repo.delete("missing").await.unwrap();
        assert_eq!(repo.paginate(0, 10).await.unwrap().len(), 2);

        repo.clear().await.unwrap();
        assert!(repo.paginate(0, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_paginate_orders_by_key() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        for key in ["k3", "k1", "k4", "k2"] {
            repo.set(&CacheEntry::without_expiry(key, key)).await.unwrap();
        }

        let first: Vec<String> = repo
            .paginate(0, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.key)
            .collect();
        let second: Vec<String> = repo
            .paginate(2, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.key)
            .collect();

        assert_eq!(first, vec!["k1", "k2"]);
        assert_eq!(second, vec!["k3", "k4"]);
    }
}
