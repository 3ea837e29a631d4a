//! In-process lock store.

use super::LockStore;
use crate::error::{LockError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// Lock store backed by a mutex-protected map.
///
/// Expired entries are purged lazily on access. Expiry uses the tokio clock,
/// so tests running with paused time see TTLs elapse deterministically.
///
/// The store can be switched into an unavailable mode in which every
/// operation fails with `StoreUnavailable`, and it counts operations so
/// callers can assert that no round-trip happened.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    unavailable: AtomicBool,
    operations: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of operations issued against the store so far.
    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Count the operation and fail it when the store is marked unavailable.
    fn begin(&self, op: &str) -> Result<MutexGuard<'_, HashMap<String, Entry>>> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LockError::StoreUnavailable(format!(
                "memory store is offline ({})",
                op
            )));
        }
        // A poisoned map is still structurally valid; keep serving it.
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        Ok(entries)
    }
}

#[async_trait]
impl LockStore for MemoryStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut entries = self.begin("set_if_absent")?;
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.begin("get")?;
        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool> {
        let mut entries = self.begin("compare_and_delete")?;
        match entries.get(key) {
            Some(entry) if entry.value == expected => {
                entries.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remaining_ttl(&self, key: &str) -> Result<Option<Duration>> {
        let entries = self.begin("remaining_ttl")?;
        let now = Instant::now();
        Ok(entries
            .get(key)
            .map(|entry| entry.expires_at.saturating_duration_since(now)))
    }
}
