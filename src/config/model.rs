//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for keylock.
///
/// This struct represents the contents of `keylock.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Store settings
    // =========================================================================
    /// Connection URL of the Redis-compatible store.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Prefix prepended to every lock key (e.g. `"locks:"`).
    #[serde(default)]
    pub key_prefix: String,

    // =========================================================================
    // Lock policy
    // =========================================================================
    /// Lock TTL in milliseconds.
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,

    /// Delay between acquisition attempts in milliseconds.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Give up waiting for a lock after this many milliseconds (unset waits forever).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquire_timeout_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            key_prefix: String::new(),
            ttl_ms: default_ttl_ms(),
            retry_interval_ms: default_retry_interval_ms(),
            acquire_timeout_ms: None,
        }
    }
}
