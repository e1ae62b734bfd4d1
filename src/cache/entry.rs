//! Stored Value Module
//!
//! Defines the in-memory item held by every entry store.

use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

/// Ceiling for deadlines that would overflow the clock.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

// == Stored Value ==
/// A value together with its absolute expiry deadline.
#[derive(Debug, Clone)]
pub struct StoredValue {
    /// The opaque payload
    pub value: Bytes,
    /// Deadline after which the value reads as a miss
    pub expires_at: Instant,
}

impl StoredValue {
    // == Constructor ==
    /// Creates a stored value that expires `ttl` from now.
    pub fn new(value: Bytes, ttl: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).unwrap_or_else(|| now + MAX_TTL);

        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the value has expired.
    ///
    /// A value is still live at exactly its deadline and expired strictly
    /// after it.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Checks expiry against an explicit instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now > self.expires_at
    }

    /// Returns the payload if the value is still live.
    pub fn live_value(&self) -> Option<Bytes> {
        if self.is_expired() {
            None
        } else {
            Some(self.value.clone())
        }
    }
}
