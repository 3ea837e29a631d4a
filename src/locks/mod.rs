//! Locking subsystem for keylock.
//!
//! A logical lock is one key in a shared store whose value is the holder's
//! token and whose expiry is the lock TTL.
//!
//! # Acquire
//!
//! A fresh [`LockToken`] is generated per acquisition. The coordinator then
//! sleeps `retry_interval` and attempts an atomic set-if-absent with the TTL,
//! repeating until the set wins, the caller cancels, or the optional acquire
//! timeout elapses. Waiters are not queued; any of them may win next.
//!
//! # Release
//!
//! The record is read first. If it is missing or carries another token the
//! release is a no-op ([`ReleaseOutcome::NotHeld`] / [`ReleaseOutcome::Foreign`]).
//! Otherwise a server-side compare-and-delete removes it; losing that race
//! to an expiry yields [`ReleaseOutcome::Expired`].
//!
//! # RAII Guards
//!
//! Locks are handed out as [`LockGuard`]s. Dropping an unreleased guard
//! releases in the background; [`LockCoordinator::with_lock`] wraps an
//! operation so that release runs on every exit path without masking the
//! operation's own result.

mod guard;
mod metadata;
mod observer;
mod operations;
mod policy;
mod token;
mod types;

#[cfg(test)]
mod tests;

// Re-export public API
pub use guard::LockGuard;
pub use metadata::holder_identity;
pub use observer::{LockEvent, LockObserver, TracingObserver};
pub use operations::LockCoordinator;
pub use policy::{DEFAULT_RETRY_INTERVAL, DEFAULT_TTL, LockPolicy};
pub use token::LockToken;
pub use types::{LockStatus, ReleaseOutcome};
