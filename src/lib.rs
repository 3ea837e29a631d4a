//! Keylock: distributed mutual exclusion over a shared key-value store.
//!
//! A logical lock is a single store key holding a random token with a TTL.
//! [`locks::LockCoordinator`] acquires by polling an atomic set-if-absent and
//! releases with an atomic compare-and-delete, so a holder can never delete a
//! record it no longer owns. A crashed holder's record clears at its TTL.
//!
//! ```no_run
//! use keylock::locks::{LockCoordinator, LockPolicy};
//! use keylock::store::RedisStore;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> keylock::error::Result<()> {
//! let store = RedisStore::connect("redis://127.0.0.1:6379/").await?;
//! let coordinator = LockCoordinator::new(Arc::new(store));
//!
//! let guard = coordinator
//!     .acquire("job:1", &LockPolicy::default(), &CancellationToken::new())
//!     .await?;
//! // ... protected work ...
//! guard.release().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod exit_codes;
pub mod locks;
pub mod store;
