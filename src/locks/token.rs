//! Lock tokens.

use crate::error::{LockError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque value proving that one specific acquisition owns a lock record.
///
/// Tokens are random v4 UUIDs, generated fresh for every acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockToken(String);

impl LockToken {
    /// Generate a new random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap a token obtained elsewhere (e.g. printed by `keylock acquire`).
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(LockError::InvalidArgument(
                "lock token must not be empty".to_string(),
            ));
        }
        Ok(Self(token.to_string()))
    }

    /// Get the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LockToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for LockToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl AsRef<str> for LockToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
