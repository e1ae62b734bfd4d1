//! Error types for the cache library
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for every cache layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key absent, deleted or expired. A normal outcome, not a fault.
    #[error("Cache miss: {0}")]
    Miss(String),

    /// Invalid configuration detected at construction
    #[error("Invalid configuration: {0}")]
    Validation(String),

    /// A durable-storage operation failed
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// A value could not be encoded or decoded
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// The async persistence queue no longer accepts entries
    #[error("Persistence queue is closed")]
    QueueClosed,
}

impl CacheError {
    /// Returns true for the miss outcome.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::Miss(_))
    }
}

// == Conversions ==
impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        CacheError::Persistence(err.to_string())
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for CacheError {
    fn from(err: tokio_postgres::Error) -> Self {
        CacheError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for CacheError {
    fn from(err: bincode::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

impl From<tokio::task::JoinError> for CacheError {
    fn from(err: tokio::task::JoinError) -> Self {
        CacheError::Persistence(format!("blocking task failed: {}", err))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache library.
pub type Result<T> = std::result::Result<T, CacheError>;
