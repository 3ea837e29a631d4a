//! Per-acquisition timing policy.

use crate::error::{LockError, Result};
use std::time::Duration;

/// Default lock TTL.
pub const DEFAULT_TTL: Duration = Duration::from_millis(6000);

/// Default delay between acquisition attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// How long a lock lives and how often a waiter polls for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    /// Store-enforced expiry of the lock record.
    pub ttl: Duration,

    /// Sleep before each acquisition attempt.
    pub retry_interval: Duration,

    /// Give up waiting after this long. `None` waits until success or cancellation.
    pub acquire_timeout: Option<Duration>,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            acquire_timeout: None,
        }
    }
}

impl LockPolicy {
    /// Create a policy with no acquire timeout.
    pub fn new(ttl: Duration, retry_interval: Duration) -> Self {
        Self {
            ttl,
            retry_interval,
            acquire_timeout: None,
        }
    }

    /// Create a policy from millisecond values.
    pub fn from_millis(ttl_ms: u64, retry_interval_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(ttl_ms),
            Duration::from_millis(retry_interval_ms),
        )
    }

    /// Bound the acquire wait.
    #[must_use]
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }

    /// Reject TTLs the store cannot express (anything under one millisecond)
    /// and zero acquire timeouts.
    pub fn validate(&self) -> Result<()> {
        if self.ttl < Duration::from_millis(1) {
            return Err(LockError::InvalidArgument(format!(
                "lock ttl must be at least 1ms (got {:?})",
                self.ttl
            )));
        }
        if self.acquire_timeout == Some(Duration::ZERO) {
            return Err(LockError::InvalidArgument(
                "acquire timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
