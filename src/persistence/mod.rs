//! Persistence Module
//!
//! Two independent durability paths over a [`Repository`](crate::repository::Repository):
//! - `PersistentCache`: synchronous write-through wrapper around a cache
//! - `AsyncPersistenceManager`: queued, retried, fire-and-forget writes

mod async_manager;
mod stats;
mod write_through;

#[cfg(test)]
pub(crate) mod test_support;

pub use async_manager::AsyncPersistenceManager;
pub use stats::PersistenceStats;
pub use write_through::PersistentCache;
