//! PostgreSQL repository.
//!
//! Same `cache` table shape as the SQLite repository, with the payload in a
//! `BYTEA` column. The connection runs on its own spawned task.

use async_trait::async_trait;
use bytes::Bytes;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{error, info};

use crate::error::{CacheError, Result};
use crate::repository::{unix_now, CacheEntry, Repository};

// == SQL Statements ==
const SQL_CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS cache (
        key TEXT PRIMARY KEY,
        value BYTEA,
        expires_at BIGINT
    )";

const SQL_GET_ENTRY: &str = "SELECT value, expires_at FROM cache WHERE key = $1";

const SQL_UPSERT_ENTRY: &str = "
    INSERT INTO cache (key, value, expires_at)
    VALUES ($1, $2, $3)
    ON CONFLICT (key) DO UPDATE SET
        value = EXCLUDED.value,
        expires_at = EXCLUDED.expires_at";

const SQL_DELETE_ENTRY: &str = "DELETE FROM cache WHERE key = $1";

const SQL_CLEAR_ENTRIES: &str = "DELETE FROM cache";

const SQL_PAGINATE_ENTRIES: &str = "
    SELECT key, value, expires_at FROM cache
    ORDER BY key ASC LIMIT $1 OFFSET $2";

// == Postgres Repository ==
/// Repository persisting records to a PostgreSQL database.
pub struct PostgresRepository {
    client: Client,
}

impl PostgresRepository {
    // == Constructor ==
    /// Connects with `dsn` (libpq key/value or URL form, no TLS) and ensures
    /// the table exists.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(dsn, NoTls).await?;

        tokio::spawn(async move {
            if let Err(err) = connection.await {
                error!(error = %err, "PostgreSQL connection closed with error");
            }
        });

        client.batch_execute(SQL_CREATE_TABLE).await?;
        info!("PostgreSQL repository ready");

        Ok(Self { client })
    }
}

/// Converts `(offset, limit)` to the `BIGINT` bounds the paginate query takes.
fn page_bounds(offset: usize, limit: usize) -> (i64, i64) {
    (
        i64::try_from(offset).unwrap_or(i64::MAX),
        i64::try_from(limit).unwrap_or(i64::MAX),
    )
}

fn entry_from_row(row: &Row) -> Result<CacheEntry> {
    let key: String = row.try_get(0)?;
    let value: Vec<u8> = row.try_get(1)?;
    let expires_at: i64 = row.try_get(2)?;
    Ok(CacheEntry::new(key, Bytes::from(value), expires_at))
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get(&self, key: &str) -> Result<CacheEntry> {
        let Some(row) = self.client.query_opt(SQL_GET_ENTRY, &[&key]).await? else {
            return Err(CacheError::Miss(key.to_string()));
        };

        let value: Vec<u8> = row.try_get(0)?;
        let entry = CacheEntry::new(key, Bytes::from(value), row.try_get(1)?);
        if entry.is_expired_at(unix_now()) {
            self.client.execute(SQL_DELETE_ENTRY, &[&key]).await?;
            return Err(CacheError::Miss(entry.key));
        }
        Ok(entry)
    }

    async fn set(&self, entry: &CacheEntry) -> Result<()> {
        let value: &[u8] = &entry.value;
        self.client
            .execute(SQL_UPSERT_ENTRY, &[&entry.key, &value, &entry.expires_at])
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client.execute(SQL_DELETE_ENTRY, &[&key]).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.client.execute(SQL_CLEAR_ENTRIES, &[]).await?;
        Ok(())
    }

    async fn paginate(&self, offset: usize, limit: usize) -> Result<Vec<CacheEntry>> {
        let (offset, limit) = page_bounds(offset, limit);
        let rows = self
            .client
            .query(SQL_PAGINATE_ENTRIES, &[&limit, &offset])
            .await?;

        rows.iter().map(entry_from_row).collect()
    }
}
