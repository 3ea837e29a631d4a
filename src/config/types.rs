//! Configuration constants and default value functions.

/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "keylock.yaml";

/// Environment variable overriding `redis_url`.
pub const REDIS_URL_ENV: &str = "KEYLOCK_REDIS_URL";

// Default value functions for serde
pub(crate) fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}
pub(crate) fn default_ttl_ms() -> u64 {
    6000
}
pub(crate) fn default_retry_interval_ms() -> u64 {
    50
}
