//! Observability hooks for lock activity.
//!
//! The coordinator reports every state change as a [`LockEvent`] to an
//! injected [`LockObserver`]. The default [`TracingObserver`] turns events
//! into structured `tracing` records; tests install a recorder instead.

use super::token::LockToken;
use super::types::ReleaseOutcome;
use crate::error::LockError;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// A lock state change.
#[derive(Debug, Clone, PartialEq)]
pub enum LockEvent {
    /// An attempt found the key held by someone else.
    Contended {
        key: String,
        holder: String,
        attempt: u32,
    },

    /// The conditional set succeeded.
    Acquired {
        key: String,
        holder: String,
        token: LockToken,
        attempts: u32,
        waited: Duration,
        ttl: Duration,
    },

    /// The wait ended without the lock (cancelled, timed out, or store failure).
    AcquireAborted {
        key: String,
        holder: String,
        attempts: u32,
        error: LockError,
    },

    /// A release completed, cleanly or as a no-op.
    Released {
        key: String,
        holder: String,
        token: LockToken,
        outcome: ReleaseOutcome,
    },

    /// A release could not reach the store; the record will clear at its TTL.
    ReleaseFailed {
        key: String,
        holder: String,
        token: LockToken,
        error: LockError,
    },
}

impl LockEvent {
    /// The lock key this event refers to.
    pub fn key(&self) -> &str {
        match self {
            LockEvent::Contended { key, .. }
            | LockEvent::Acquired { key, .. }
            | LockEvent::AcquireAborted { key, .. }
            | LockEvent::Released { key, .. }
            | LockEvent::ReleaseFailed { key, .. } => key,
        }
    }
}

/// Receives lock events from a coordinator.
pub trait LockObserver: Send + Sync {
    fn record(&self, event: &LockEvent);
}

/// Observer that emits `tracing` events with structured fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl LockObserver for TracingObserver {
    fn record(&self, event: &LockEvent) {
        match event {
            LockEvent::Contended {
                key,
                holder,
                attempt,
            } => {
                debug!(key = %key, holder = %holder, attempt, "Lock is held by another holder");
            }
            LockEvent::Acquired {
                key,
                holder,
                token,
                attempts,
                waited,
                ttl,
            } => {
                info!(
                    key = %key,
                    holder = %holder,
                    token = %token,
                    attempts,
                    waited_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                    ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
                    "Acquired lock"
                );
            }
            LockEvent::AcquireAborted {
                key,
                holder,
                attempts,
                error: err,
            } => {
                if err.is_abandoned() {
                    warn!(
                        key = %key,
                        holder = %holder,
                        attempts,
                        error = %err,
                        "Gave up waiting for lock"
                    );
                } else {
                    error!(
                        key = %key,
                        holder = %holder,
                        attempts,
                        error = %err,
                        "Lock acquisition failed"
                    );
                }
            }
            LockEvent::Released {
                key,
                holder,
                token,
                outcome,
            } => {
                if outcome.is_released() {
                    info!(key = %key, holder = %holder, token = %token, "Released lock");
                } else {
                    warn!(
                        key = %key,
                        holder = %holder,
                        token = %token,
                        outcome = %outcome,
                        "Release was a no-op; lock was not owned by this token"
                    );
                }
            }
            LockEvent::ReleaseFailed {
                key,
                holder,
                token,
                error: err,
            } => {
                error!(
                    key = %key,
                    holder = %holder,
                    token = %token,
                    error = %err,
                    "Failed to release lock; it will expire at its TTL"
                );
            }
        }
    }
}
