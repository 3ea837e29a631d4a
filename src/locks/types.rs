//! Release outcomes and lock status snapshots.

use super::token::LockToken;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// What a release did to the store.
///
/// Only `Released` deleted anything. The other outcomes are no-ops that mean
/// the caller no longer owns the record; none of them is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseOutcome {
    /// The caller's record was deleted.
    Released,
    /// No record exists for the key (never acquired, or already expired).
    NotHeld,
    /// The record belongs to another token.
    Foreign,
    /// The record expired or was taken over between the ownership check and the delete.
    Expired,
}

impl ReleaseOutcome {
    /// Get the outcome as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseOutcome::Released => "released",
            ReleaseOutcome::NotHeld => "not_held",
            ReleaseOutcome::Foreign => "foreign",
            ReleaseOutcome::Expired => "expired",
        }
    }

    /// Whether the release deleted the caller's record.
    pub fn is_released(&self) -> bool {
        matches!(self, ReleaseOutcome::Released)
    }
}

impl std::fmt::Display for ReleaseOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a lock key as seen in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockStatus {
    /// No record exists.
    Unlocked,
    /// A record exists.
    Locked {
        /// Token of the current holder.
        token: LockToken,
        /// Time left before the store expires the record, when known.
        remaining_ttl: Option<Duration>,
    },
}

impl LockStatus {
    /// Whether a record currently exists.
    pub fn is_locked(&self) -> bool {
        matches!(self, LockStatus::Locked { .. })
    }

    /// Wall-clock expiry estimated from the remaining TTL.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            LockStatus::Locked {
                remaining_ttl: Some(ttl),
                ..
            } => chrono::Duration::from_std(*ttl).ok().map(|ttl| Utc::now() + ttl),
            _ => None,
        }
    }
}

impl std::fmt::Display for LockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockStatus::Unlocked => write!(f, "unlocked"),
            LockStatus::Locked {
                token,
                remaining_ttl: Some(ttl),
            } => write!(f, "locked (token: {}, expires in: {}ms)", token, ttl.as_millis()),
            LockStatus::Locked {
                token,
                remaining_ttl: None,
            } => write!(f, "locked (token: {}, no expiry)", token),
        }
    }
}
