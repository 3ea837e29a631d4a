//! Config loading, validation, and utility operations.

use super::model::Config;
use super::types::{DEFAULT_CONFIG_FILE, REDIS_URL_ENV};
use crate::error::{LockError, Result};
use crate::locks::LockPolicy;
use std::path::Path;
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the config file
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(LockError::ConfigError)` - Read error, parse error, or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            LockError::ConfigError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Resolve the effective config.
    ///
    /// An explicit path must exist. Without one, `keylock.yaml` in `dir` is
    /// used when present, otherwise defaults. `KEYLOCK_REDIS_URL` then
    /// overrides `redis_url`.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => {
                let candidate = dir.join(DEFAULT_CONFIG_FILE);
                if candidate.is_file() {
                    Self::load(candidate)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse config from a YAML string.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| LockError::ConfigError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            LockError::ConfigError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(REDIS_URL_ENV)
            && !url.trim().is_empty()
        {
            self.redis_url = url.trim().to_string();
        }
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `redis_url` must be non-empty
    /// - `ttl_ms` must be positive
    /// - `acquire_timeout_ms`, when set, must be positive
    pub fn validate(&self) -> Result<()> {
        if self.redis_url.trim().is_empty() {
            return Err(LockError::ConfigError(
                "config validation failed: redis_url must not be empty".to_string(),
            ));
        }

        if self.ttl_ms == 0 {
            return Err(LockError::ConfigError(
                "config validation failed: ttl_ms must be greater than 0".to_string(),
            ));
        }

        if self.acquire_timeout_ms == Some(0) {
            return Err(LockError::ConfigError(
                "config validation failed: acquire_timeout_ms must be greater than 0 (omit it to wait indefinitely)"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Build the lock policy described by this config.
    pub fn policy(&self) -> LockPolicy {
        let policy = LockPolicy::from_millis(self.ttl_ms, self.retry_interval_ms);
        match self.acquire_timeout_ms {
            Some(ms) => policy.with_acquire_timeout(Duration::from_millis(ms)),
            None => policy,
        }
    }

    /// Apply `key_prefix` to a lock key.
    pub fn qualify(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}
