//! RAII lock guard implementation.

use super::operations::LockCoordinator;
use super::token::LockToken;
use super::types::ReleaseOutcome;
use crate::error::Result;
use std::time::Duration;
use tokio::time::Instant;

/// RAII guard for a held lock record.
///
/// Dropping an unreleased guard spawns a best-effort release on the current
/// tokio runtime. Outside a runtime the record is left to expire at its TTL
/// and a warning is logged. Call [`LockGuard::release`] to observe the outcome.
#[derive(Debug)]
#[must_use = "dropping the guard releases the lock"]
pub struct LockGuard {
    coordinator: LockCoordinator,
    key: String,
    token: LockToken,
    ttl: Duration,
    acquired_at: Instant,

    /// Whether the lock has been released or detached.
    released: bool,
}

impl LockGuard {
    pub(super) fn new(
        coordinator: LockCoordinator,
        key: String,
        token: LockToken,
        ttl: Duration,
    ) -> Self {
        Self {
            coordinator,
            key,
            token,
            ttl,
            acquired_at: Instant::now(),
            released: false,
        }
    }

    /// The lock key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The token proving this acquisition.
    pub fn token(&self) -> &LockToken {
        &self.token
    }

    /// TTL the record was written with.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Time since the record was written.
    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    /// Whether the TTL has elapsed, so the store may already have dropped the record.
    pub fn possibly_expired(&self) -> bool {
        self.held_for() >= self.ttl
    }

    /// Release the lock and report what happened.
    ///
    /// Store failures are returned as errors; the record then clears at its TTL.
    pub async fn release(mut self) -> Result<ReleaseOutcome> {
        self.released = true;
        self.coordinator.release(&self.key, &self.token).await
    }

    /// Disarm the guard and hand back the token.
    ///
    /// The record stays in the store until its TTL elapses or someone
    /// releases it with the returned token.
    pub fn detach(mut self) -> LockToken {
        self.released = true;
        self.token.clone()
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let coordinator = self.coordinator.clone();
        let key = std::mem::take(&mut self.key);
        let token = self.token.clone();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                // Outcome and failures reach the observer from inside release.
                handle.spawn(async move {
                    let _ = coordinator.release(&key, &token).await;
                });
            }
            Err(_) => {
                tracing::warn!(
                    key = %key,
                    token = %token,
                    "Lock guard dropped outside a tokio runtime; lock will expire at its TTL"
                );
            }
        }
    }
}
