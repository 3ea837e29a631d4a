//! Error types for keylock.
//!
//! Uses thiserror for derive macros. Release outcomes that leave the store
//! untouched (`NotHeld`, `Foreign`, `Expired`) are values, not errors; see
//! [`crate::locks::ReleaseOutcome`].

use crate::exit_codes;
use thiserror::Error;

/// Main error type for keylock operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// Caller supplied an empty key, a zero TTL, or an otherwise unusable value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Network or protocol failure talking to the key-value store.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The caller cancelled the acquire wait.
    #[error("lock acquisition cancelled: {0}")]
    Cancelled(String),

    /// The acquire wait exceeded the policy's acquire timeout.
    #[error("lock acquisition timed out: {0}")]
    TimedOut(String),

    /// Config file could not be read, parsed, or validated.
    #[error("{0}")]
    ConfigError(String),

    /// The protected command could not be started.
    #[error("command failed: {0}")]
    CommandError(String),
}

impl LockError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LockError::InvalidArgument(_) => exit_codes::USER_ERROR,
            LockError::ConfigError(_) => exit_codes::USER_ERROR,
            LockError::CommandError(_) => exit_codes::USER_ERROR,
            LockError::StoreUnavailable(_) => exit_codes::STORE_FAILURE,
            LockError::Cancelled(_) => exit_codes::LOCK_NOT_ACQUIRED,
            LockError::TimedOut(_) => exit_codes::LOCK_NOT_ACQUIRED,
        }
    }

    /// Whether the error means the wait ended without the lock, as opposed to a failure.
    pub fn is_abandoned(&self) -> bool {
        matches!(self, LockError::Cancelled(_) | LockError::TimedOut(_))
    }
}

impl From<redis::RedisError> for LockError {
    fn from(err: redis::RedisError) -> Self {
        LockError::StoreUnavailable(err.to_string())
    }
}

/// Result type alias for keylock operations.
pub type Result<T> = std::result::Result<T, LockError>;
