//! Lock acquisition, release, and inspection.

use super::guard::LockGuard;
use super::metadata::holder_identity;
use super::observer::{LockEvent, LockObserver, TracingObserver};
use super::policy::LockPolicy;
use super::token::LockToken;
use super::types::{LockStatus, ReleaseOutcome};
use crate::error::{LockError, Result};
use crate::store::LockStore;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Acquires and releases lock records in a shared store.
///
/// The coordinator keeps no per-key state and takes no local locks: the
/// store's conditional set decides every race. Cloning is cheap.
#[derive(Clone)]
pub struct LockCoordinator {
    store: Arc<dyn LockStore>,
    observer: Arc<dyn LockObserver>,
    holder: Arc<str>,
}

impl std::fmt::Debug for LockCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockCoordinator")
            .field("holder", &self.holder)
            .finish_non_exhaustive()
    }
}

impl LockCoordinator {
    /// Create a coordinator that reports through `tracing`.
    pub fn new(store: Arc<dyn LockStore>) -> Self {
        Self {
            store,
            observer: Arc::new(TracingObserver),
            holder: holder_identity().into(),
        }
    }

    /// Replace the observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn LockObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replace the holder identity reported in events.
    #[must_use]
    pub fn with_holder(mut self, holder: impl Into<String>) -> Self {
        self.holder = holder.into().into();
        self
    }

    /// The holder identity reported in events.
    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Acquire `key`, polling every `policy.retry_interval` until the
    /// conditional set wins.
    ///
    /// # Returns
    ///
    /// * `Ok(LockGuard)` - The record was written with a fresh token
    /// * `Err(LockError::InvalidArgument)` - Empty key or sub-millisecond TTL (no store call made)
    /// * `Err(LockError::StoreUnavailable)` - The store failed; the lock was not granted
    /// * `Err(LockError::Cancelled)` - `cancel` fired while waiting
    /// * `Err(LockError::TimedOut)` - The key was still held once `policy.acquire_timeout` elapsed
    pub async fn acquire(
        &self,
        key: &str,
        policy: &LockPolicy,
        cancel: &CancellationToken,
    ) -> Result<LockGuard> {
        validate_key(key)?;
        policy.validate()?;

        let token = LockToken::generate();
        let started = Instant::now();
        let deadline = policy.acquire_timeout.map(|timeout| started + timeout);
        let mut attempts: u32 = 0;

        loop {
            let wait = match deadline {
                Some(deadline) => policy
                    .retry_interval
                    .min(deadline.saturating_duration_since(Instant::now())),
                None => policy.retry_interval,
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(self.abort(key, attempts, LockError::Cancelled(key.to_string())));
                }
                _ = tokio::time::sleep(wait) => {}
            }

            // Every completed wait earns an attempt, including the one ending at the deadline
            attempts = attempts.saturating_add(1);
            match self
                .store
                .set_if_absent(key, token.as_str(), policy.ttl)
                .await
            {
                Ok(true) => {
                    self.observer.record(&LockEvent::Acquired {
                        key: key.to_string(),
                        holder: self.holder.to_string(),
                        token: token.clone(),
                        attempts,
                        waited: started.elapsed(),
                        ttl: policy.ttl,
                    });
                    return Ok(LockGuard::new(
                        self.clone(),
                        key.to_string(),
                        token,
                        policy.ttl,
                    ));
                }
                Ok(false) => {
                    self.observer.record(&LockEvent::Contended {
                        key: key.to_string(),
                        holder: self.holder.to_string(),
                        attempt: attempts,
                    });

                    if let Some(deadline) = deadline
                        && Instant::now() >= deadline
                    {
                        let err = LockError::TimedOut(format!(
                            "{} (waited {}ms, {} attempts)",
                            key,
                            started.elapsed().as_millis(),
                            attempts
                        ));
                        return Err(self.abort(key, attempts, err));
                    }
                }
                Err(err) => return Err(self.abort(key, attempts, err)),
            }
        }
    }

    /// Release `key` if, and only if, its record still carries `token`.
    ///
    /// A record that is missing or owned by another token is never deleted.
    ///
    /// # Returns
    ///
    /// * `Ok(ReleaseOutcome::Released)` - The record was deleted
    /// * `Ok(ReleaseOutcome::NotHeld)` - No record exists
    /// * `Ok(ReleaseOutcome::Foreign)` - Another token holds the record
    /// * `Ok(ReleaseOutcome::Expired)` - The record changed between the check and the delete
    /// * `Err(LockError::StoreUnavailable)` - The store failed; the record clears at its TTL
    pub async fn release(&self, key: &str, token: &LockToken) -> Result<ReleaseOutcome> {
        validate_key(key)?;

        let outcome = match self.try_release(key, token).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.observer.record(&LockEvent::ReleaseFailed {
                    key: key.to_string(),
                    holder: self.holder.to_string(),
                    token: token.clone(),
                    error: err.clone(),
                });
                return Err(err);
            }
        };

        self.observer.record(&LockEvent::Released {
            key: key.to_string(),
            holder: self.holder.to_string(),
            token: token.clone(),
            outcome,
        });
        Ok(outcome)
    }

    async fn try_release(&self, key: &str, token: &LockToken) -> Result<ReleaseOutcome> {
        match self.store.get(key).await? {
            None => Ok(ReleaseOutcome::NotHeld),
            Some(current) if current != token.as_str() => Ok(ReleaseOutcome::Foreign),
            Some(_) => {
                if self.store.compare_and_delete(key, token.as_str()).await? {
                    Ok(ReleaseOutcome::Released)
                } else {
                    Ok(ReleaseOutcome::Expired)
                }
            }
        }
    }

    /// Read the current record for `key`.
    pub async fn status(&self, key: &str) -> Result<LockStatus> {
        validate_key(key)?;

        let Some(value) = self.store.get(key).await? else {
            return Ok(LockStatus::Unlocked);
        };
        let (value, remaining_ttl) = match self.store.remaining_ttl(key).await? {
            Some(ttl) => (value, Some(ttl)),
            // No TTL either means a record without expiry or one that expired
            // between the two reads; a second read tells them apart.
            None => match self.store.get(key).await? {
                Some(current) => (current, None),
                None => return Ok(LockStatus::Unlocked),
            },
        };

        Ok(LockStatus::Locked {
            token: LockToken::from(value),
            remaining_ttl,
        })
    }

    /// Run `op` while holding `key`.
    ///
    /// The lock is released on every exit path. The operation's output,
    /// including its own errors, is returned unchanged; a failed release is
    /// reported to the observer and never replaces it. If the returned
    /// future is dropped mid-operation, the guard's `Drop` releases the lock.
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The operation ran; `T` is whatever it returned
    /// * `Err(LockError)` - The lock was never acquired and `op` did not run
    pub async fn with_lock<F, Fut, T>(
        &self,
        key: &str,
        policy: &LockPolicy,
        cancel: &CancellationToken,
        op: F,
    ) -> Result<T>
    where
        F: FnOnce(LockToken) -> Fut,
        Fut: Future<Output = T>,
    {
        let guard = self.acquire(key, policy, cancel).await?;
        let output = op(guard.token().clone()).await;

        // Release failures were already reported to the observer.
        let _ = guard.release().await;

        Ok(output)
    }

    fn abort(&self, key: &str, attempts: u32, err: LockError) -> LockError {
        self.observer.record(&LockEvent::AcquireAborted {
            key: key.to_string(),
            holder: self.holder.to_string(),
            attempts,
            error: err.clone(),
        });
        err
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(LockError::InvalidArgument(
            "lock key must not be empty".to_string(),
        ));
    }
    Ok(())
}
