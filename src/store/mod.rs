//! Key-value store adapters for keylock.
//!
//! A lock record is a single key whose value is the holder's token and whose
//! expiry is the lock TTL. Adapters expose only the atomic primitives the
//! coordinator needs; retry and timing policy live in [`crate::locks`].
//!
//! # Backends
//!
//! - [`RedisStore`]: `SET NX PX` plus a server-evaluated compare-and-delete script.
//! - [`MemoryStore`]: in-process map with TTLs, for tests and single-process use.

mod memory;
mod redis_store;


use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

// Re-export public API
pub use memory::MemoryStore;
pub use redis_store::{RELEASE_SCRIPT, RedisStore};

/// Atomic operations a key-value backend must provide to host lock records.
///
/// Every method is one round-trip and must be atomic on the store side.
/// Transport or protocol failures are reported as
/// [`LockError::StoreUnavailable`](crate::error::LockError::StoreUnavailable).
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Set `key = value` with expiry `ttl` only if `key` does not exist.
    ///
    /// Returns whether the set happened.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Current value of `key`, or `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Delete `key` only if its current value equals `expected`.
    ///
    /// Returns whether a deletion happened.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool>;

    /// Remaining time-to-live of `key`, or `None` when absent or persistent.
    async fn remaining_ttl(&self, key: &str) -> Result<Option<Duration>>;
}
