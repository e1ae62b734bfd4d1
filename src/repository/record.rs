//! Durable record shape.

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `expires_at` marker for records with no durable deadline.
pub const NO_EXPIRY: i64 = 0;

/// Current Unix time in whole seconds.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

// == Cache Entry ==
/// A key, its serialized value and an optional deadline in Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: Bytes,
    /// Unix seconds; `NO_EXPIRY` (or any value <= 0) never expires
    pub expires_at: i64,
}

impl CacheEntry {
    /// Creates a record with an explicit deadline.
    pub fn new(key: impl Into<String>, value: impl Into<Bytes>, expires_at: i64) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            expires_at,
        }
    }

    /// Creates a record that never expires in durable storage.
    pub fn without_expiry(key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self::new(key, value, NO_EXPIRY)
    }

    /// Creates a record expiring `ttl` from now, rounded down to whole seconds.
    pub fn with_ttl(key: impl Into<String>, value: impl Into<Bytes>, ttl: Duration) -> Self {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self::new(key, value, unix_now().saturating_add(ttl_secs))
    }

    /// True when the record carries a deadline that `now` has passed.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at > NO_EXPIRY && now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_now())
    }

    /// The deadline as a timestamp, if the record has one.
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        if self.expires_at > NO_EXPIRY {
            DateTime::from_timestamp(self.expires_at, 0)
        } else {
            None
        }
    }
}
