//! Exit code constants for the keylock CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config, command could not be spawned)
//! - 2: Store unavailable
//! - 3: Lock not acquired (cancelled or timed out)
//! - 4: Release was a no-op (lock not held, foreign, or expired)
//!
//! `keylock run` passes the child's exit code through unchanged, so these
//! codes only describe keylock's own failures.

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid config, or unspawnable command.
pub const USER_ERROR: i32 = 1;

/// The key-value store could not be reached or returned a protocol error.
pub const STORE_FAILURE: i32 = 2;

/// The lock was not acquired before cancellation or the acquire timeout.
pub const LOCK_NOT_ACQUIRED: i32 = 3;

/// Release did not delete anything because the caller no longer owned the record.
pub const RELEASE_NOOP: i32 = 4;
