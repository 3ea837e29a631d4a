//! Tests for the locks subsystem.

use super::*;
use crate::error::{LockError, Result};
use crate::store::{LockStore, MemoryStore};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Observer that keeps every event for later assertions.
#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<LockEvent>>,
}

impl RecordingObserver {
    fn events(&self) -> Vec<LockEvent> {
        self.events.lock().unwrap().clone()
    }

    fn count(&self, pred: impl Fn(&LockEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

impl LockObserver for RecordingObserver {
    fn record(&self, event: &LockEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Create a coordinator over a fresh memory store with a recording observer.
fn create_test_coordinator() -> (Arc<MemoryStore>, Arc<RecordingObserver>, LockCoordinator) {
    let store = Arc::new(MemoryStore::new());
    let observer = Arc::new(RecordingObserver::default());
    let coordinator = LockCoordinator::new(store.clone())
        .with_observer(observer.clone())
        .with_holder("test@host:1");
    (store, observer, coordinator)
}

fn policy(ttl_ms: u64, retry_ms: u64) -> LockPolicy {
    LockPolicy::from_millis(ttl_ms, retry_ms)
}

#[tokio::test(start_paused = true)]
async fn test_acquire_writes_token_with_ttl() {
    let (store, observer, coordinator) = create_test_coordinator();

    let guard = coordinator
        .acquire("job:0", &policy(1000, 50), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(guard.key(), "job:0");
    assert_eq!(guard.ttl(), Duration::from_millis(1000));
    assert_eq!(
        store.get("job:0").await.unwrap().as_deref(),
        Some(guard.token().as_str())
    );
    assert_eq!(
        store.remaining_ttl("job:0").await.unwrap(),
        Some(Duration::from_millis(1000))
    );
    assert_eq!(
        observer.count(|e| matches!(e, LockEvent::Acquired { attempts: 1, .. })),
        1
    );

    assert_eq!(guard.release().await.unwrap(), ReleaseOutcome::Released);
    assert_eq!(store.get("job:0").await.unwrap(), None);
}

#[tokio::test]
async fn test_acquire_empty_key_makes_no_store_calls() {
    let (store, _observer, coordinator) = create_test_coordinator();

    let err = coordinator
        .acquire("", &policy(1000, 50), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, LockError::InvalidArgument(_)));
    assert_eq!(store.operations(), 0);
}

#[tokio::test]
async fn test_acquire_zero_ttl_is_rejected() {
    let (store, _observer, coordinator) = create_test_coordinator();

    let err = coordinator
        .acquire("job:0", &policy(0, 50), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, LockError::InvalidArgument(_)));
    assert_eq!(store.operations(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_sequential_acquisitions_use_distinct_tokens() {
    let (_store, _observer, coordinator) = create_test_coordinator();
    let cancel = CancellationToken::new();

    let first = coordinator
        .acquire("job:seq", &policy(1000, 10), &cancel)
        .await
        .unwrap();
    let first_token = first.token().clone();
    first.release().await.unwrap();

    let second = coordinator
        .acquire("job:seq", &policy(1000, 10), &cancel)
        .await
        .unwrap();

    assert_ne!(first_token, *second.token());
    second.release().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_waiter_acquires_within_one_interval_of_release() {
    let (_store, observer, coordinator) = create_test_coordinator();
    let cancel = CancellationToken::new();

    let holder_a = coordinator
        .acquire("job:1", &policy(6000, 50), &cancel)
        .await
        .unwrap();

    let waiter = {
        let coordinator = coordinator.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let guard = coordinator
                .acquire("job:1", &policy(6000, 50), &cancel)
                .await
                .unwrap();
            (guard, Instant::now())
        })
    };

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!waiter.is_finished());
    assert!(observer.count(|e| matches!(e, LockEvent::Contended { .. })) >= 5);

    let token_a = holder_a.token().clone();
    assert_eq!(holder_a.release().await.unwrap(), ReleaseOutcome::Released);
    let released_at = Instant::now();

    let (holder_b, acquired_at) = waiter.await.unwrap();
    assert!(acquired_at.duration_since(released_at) <= Duration::from_millis(50));
    assert_ne!(*holder_b.token(), token_a);
    holder_b.release().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_expired_holder_cannot_release_new_holders_record() {
    let (store, _observer, coordinator) = create_test_coordinator();
    let cancel = CancellationToken::new();

    let holder_a = coordinator
        .acquire("job:2", &policy(100, 10), &cancel)
        .await
        .unwrap();

    // A never releases; its TTL lapses and B takes over.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(holder_a.possibly_expired());

    let holder_b = coordinator
        .acquire("job:2", &policy(6000, 10), &cancel)
        .await
        .unwrap();

    let outcome = holder_a.release().await.unwrap();
    assert!(!outcome.is_released());
    assert_eq!(outcome, ReleaseOutcome::Foreign);

    assert_eq!(
        store.get("job:2").await.unwrap().as_deref(),
        Some(holder_b.token().as_str())
    );
    assert_eq!(holder_b.release().await.unwrap(), ReleaseOutcome::Released);
}

#[tokio::test(start_paused = true)]
async fn test_expired_record_without_successor_is_not_held() {
    let (_store, _observer, coordinator) = create_test_coordinator();

    let guard = coordinator
        .acquire("job:3", &policy(100, 10), &CancellationToken::new())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(guard.release().await.unwrap(), ReleaseOutcome::NotHeld);
}

#[tokio::test]
async fn test_release_with_unknown_token_is_noop() {
    let (store, observer, coordinator) = create_test_coordinator();
    store
        .set_if_absent("job:4", "someone-else", Duration::from_secs(5))
        .await
        .unwrap();

    let stranger = LockToken::generate();
    let outcome = coordinator.release("job:4", &stranger).await.unwrap();

    assert_eq!(outcome, ReleaseOutcome::Foreign);
    assert_eq!(
        store.get("job:4").await.unwrap().as_deref(),
        Some("someone-else")
    );
    assert_eq!(
        observer.count(|e| matches!(
            e,
            LockEvent::Released {
                outcome: ReleaseOutcome::Foreign,
                ..
            }
        )),
        1
    );

    let outcome = coordinator.release("missing", &stranger).await.unwrap();
    assert_eq!(outcome, ReleaseOutcome::NotHeld);
}

/// Store whose record vanishes between the ownership read and the delete.
struct RacingStore {
    value: String,
}

#[async_trait]
impl LockStore for RacingStore {
    async fn set_if_absent(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<bool> {
        Ok(false)
    }

    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(Some(self.value.clone()))
    }

    async fn compare_and_delete(&self, _key: &str, _expected: &str) -> Result<bool> {
        Ok(false)
    }

    async fn remaining_ttl(&self, _key: &str) -> Result<Option<Duration>> {
        Ok(None)
    }
}

/// Store whose record disappears right after the first read, with no TTL visible.
#[derive(Default)]
struct VanishingStore {
    reads: AtomicUsize,
}

#[async_trait]
impl LockStore for VanishingStore {
    async fn set_if_absent(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<bool> {
        Ok(false)
    }

    async fn get(&self, _key: &str) -> Result<Option<String>> {
        if self.reads.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(Some("gone".to_string()))
        } else {
            Ok(None)
        }
    }

    async fn compare_and_delete(&self, _key: &str, _expected: &str) -> Result<bool> {
        Ok(false)
    }

    async fn remaining_ttl(&self, _key: &str) -> Result<Option<Duration>> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_status_of_record_expiring_between_reads_is_unlocked() {
    let coordinator = LockCoordinator::new(Arc::new(VanishingStore::default()));

    let status = coordinator.status("job:race").await.unwrap();
    assert_eq!(status, LockStatus::Unlocked);
}

#[tokio::test]
async fn test_status_of_record_without_expiry() {
    let coordinator = LockCoordinator::new(Arc::new(RacingStore {
        value: "forever".to_string(),
    }));

    let status = coordinator.status("job:race").await.unwrap();
    assert_eq!(
        status,
        LockStatus::Locked {
            token: LockToken::from("forever".to_string()),
            remaining_ttl: None,
        }
    );
    assert!(status.to_string().contains("no expiry"));
}

#[tokio::test]
async fn test_release_losing_race_to_expiry_reports_expired() {
    let token = LockToken::generate();
    let coordinator = LockCoordinator::new(Arc::new(RacingStore {
        value: token.to_string(),
    }));

    let outcome = coordinator.release("job:race", &token).await.unwrap();
    assert_eq!(outcome, ReleaseOutcome::Expired);
}

#[tokio::test(start_paused = true)]
async fn test_mutual_exclusion_under_contention() {
    let (_store, _observer, coordinator) = create_test_coordinator();
    let inside = Arc::new(AtomicUsize::new(0));
    let completed = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let coordinator = coordinator.clone();
        let inside = Arc::clone(&inside);
        let completed = Arc::clone(&completed);
        handles.push(tokio::spawn(async move {
            let guard = coordinator
                .acquire("shared", &policy(10_000, 1), &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0, "overlapping holders");
            tokio::time::sleep(Duration::from_millis(5)).await;
            inside.fetch_sub(1, Ordering::SeqCst);

            assert_eq!(guard.release().await.unwrap(), ReleaseOutcome::Released);
            completed.fetch_add(1, Ordering::SeqCst);
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(completed.load(Ordering::SeqCst), 8);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_lock_expires_and_can_be_reacquired() {
    let (_store, _observer, coordinator) = create_test_coordinator();
    let cancel = CancellationToken::new();

    let crashed = coordinator
        .acquire("job:5", &policy(100, 10), &cancel)
        .await
        .unwrap()
        .detach();

    let started = Instant::now();
    let guard = coordinator
        .acquire("job:5", &policy(100, 10), &cancel)
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(90));
    assert_ne!(*guard.token(), crashed);
    guard.release().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_cancel_interrupts_wait() {
    let (_store, observer, coordinator) = create_test_coordinator();
    let _held = coordinator
        .acquire("job:6", &policy(60_000, 10), &CancellationToken::new())
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    let waiter = {
        let coordinator = coordinator.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            coordinator
                .acquire("job:6", &policy(60_000, 10), &cancel)
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();

    let err = waiter.await.unwrap().unwrap_err();
    assert!(matches!(err, LockError::Cancelled(_)));
    assert_eq!(
        observer.count(|e| matches!(
            e,
            LockEvent::AcquireAborted {
                error: LockError::Cancelled(_),
                ..
            }
        )),
        1
    );
}

#[tokio::test]
async fn test_already_cancelled_wait_makes_no_store_calls() {
    let (store, _observer, coordinator) = create_test_coordinator();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = coordinator
        .acquire("job:7", &policy(1000, 50), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, LockError::Cancelled(_)));
    assert_eq!(store.operations(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_acquire_timeout() {
    let (_store, _observer, coordinator) = create_test_coordinator();
    let _held = coordinator
        .acquire("job:8", &policy(60_000, 10), &CancellationToken::new())
        .await
        .unwrap();

    let started = Instant::now();
    let bounded = policy(60_000, 50).with_acquire_timeout(Duration::from_millis(220));
    let err = coordinator
        .acquire("job:8", &bounded, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, LockError::TimedOut(_)));
    let waited = started.elapsed();
    assert!(waited >= Duration::from_millis(220));
    assert!(waited < Duration::from_millis(270));
}

#[tokio::test(start_paused = true)]
async fn test_acquire_timeout_shorter_than_interval_still_attempts() {
    let (store, _observer, coordinator) = create_test_coordinator();

    for timeout_ms in [50, 20] {
        let key = format!("free:{}", timeout_ms);
        let bounded = policy(1000, 50).with_acquire_timeout(Duration::from_millis(timeout_ms));

        let started = Instant::now();
        let guard = coordinator
            .acquire(&key, &bounded, &CancellationToken::new())
            .await
            .unwrap();

        assert!(started.elapsed() <= Duration::from_millis(timeout_ms + 1));
        assert_eq!(
            store.get(&key).await.unwrap().as_deref(),
            Some(guard.token().as_str())
        );
        guard.release().await.unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn test_acquire_makes_final_attempt_at_deadline() {
    let (_store, observer, coordinator) = create_test_coordinator();
    let cancel = CancellationToken::new();

    // Expires exactly when the waiter's deadline is reached
    let _crashed = coordinator
        .acquire("job:8b", &policy(100, 50), &cancel)
        .await
        .unwrap()
        .detach();

    let bounded = policy(1000, 50).with_acquire_timeout(Duration::from_millis(100));
    let guard = coordinator
        .acquire("job:8b", &bounded, &cancel)
        .await
        .unwrap();

    assert_eq!(
        observer.count(|e| matches!(e, LockEvent::Acquired { attempts: 2, .. })),
        1
    );
    assert_eq!(
        observer.count(|e| matches!(e, LockEvent::AcquireAborted { .. })),
        0
    );
    guard.release().await.unwrap();
}

#[tokio::test]
async fn test_zero_acquire_timeout_is_rejected() {
    let (store, _observer, coordinator) = create_test_coordinator();
    let bounded = policy(1000, 50).with_acquire_timeout(Duration::ZERO);

    let err = coordinator
        .acquire("job:8c", &bounded, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, LockError::InvalidArgument(_)));
    assert_eq!(store.operations(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_store_failure_during_acquire_is_surfaced() {
    let (store, observer, coordinator) = create_test_coordinator();
    store.set_unavailable(true);

    let err = coordinator
        .acquire("job:9", &policy(1000, 10), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, LockError::StoreUnavailable(_)));
    assert_eq!(
        observer.count(|e| matches!(e, LockEvent::AcquireAborted { attempts: 1, .. })),
        1
    );

    store.set_unavailable(false);
    assert_eq!(store.get("job:9").await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_store_failure_during_release_is_reported() {
    let (store, observer, coordinator) = create_test_coordinator();
    let guard = coordinator
        .acquire("job:10", &policy(1000, 10), &CancellationToken::new())
        .await
        .unwrap();

    store.set_unavailable(true);
    let err = guard.release().await.unwrap_err();

    assert!(matches!(err, LockError::StoreUnavailable(_)));
    assert_eq!(
        observer.count(|e| matches!(e, LockEvent::ReleaseFailed { .. })),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_with_lock_runs_operation_and_releases() {
    let (store, _observer, coordinator) = create_test_coordinator();

    let seen = coordinator
        .with_lock(
            "job:11",
            &policy(1000, 10),
            &CancellationToken::new(),
            |token| {
                let store = store.clone();
                async move {
                    let current = store.get("job:11").await.unwrap();
                    assert_eq!(current.as_deref(), Some(token.as_str()));
                    "done"
                }
            },
        )
        .await
        .unwrap();

    assert_eq!(seen, "done");
    assert_eq!(store.get("job:11").await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_with_lock_propagates_operation_error() {
    let (store, _observer, coordinator) = create_test_coordinator();

    let output: std::result::Result<(), String> = coordinator
        .with_lock(
            "job:12",
            &policy(1000, 10),
            &CancellationToken::new(),
            |_token| async { Err("boom".to_string()) },
        )
        .await
        .unwrap();

    assert_eq!(output, Err("boom".to_string()));
    assert_eq!(store.get("job:12").await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_with_lock_release_failure_does_not_mask_result() {
    let (store, observer, coordinator) = create_test_coordinator();

    let output = coordinator
        .with_lock(
            "job:13",
            &policy(1000, 10),
            &CancellationToken::new(),
            |_token| {
                let store = store.clone();
                async move {
                    store.set_unavailable(true);
                    42
                }
            },
        )
        .await
        .unwrap();

    assert_eq!(output, 42);
    assert_eq!(
        observer.count(|e| matches!(e, LockEvent::ReleaseFailed { .. })),
        1
    );
}

#[tokio::test]
async fn test_with_lock_skips_operation_when_not_acquired() {
    let (_store, _observer, coordinator) = create_test_coordinator();
    let ran = Arc::new(AtomicUsize::new(0));

    let ran_inner = Arc::clone(&ran);
    let result = coordinator
        .with_lock("", &policy(1000, 10), &CancellationToken::new(), |_token| async move {
            ran_inner.fetch_add(1, Ordering::SeqCst);
        })
        .await;

    assert!(matches!(result, Err(LockError::InvalidArgument(_))));
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_guard_releases_in_background() {
    let (store, observer, coordinator) = create_test_coordinator();

    let guard = coordinator
        .acquire("job:14", &policy(60_000, 10), &CancellationToken::new())
        .await
        .unwrap();
    drop(guard);

    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(store.get("job:14").await.unwrap(), None);
    assert_eq!(
        observer.count(|e| matches!(
            e,
            LockEvent::Released {
                outcome: ReleaseOutcome::Released,
                ..
            }
        )),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_detached_guard_keeps_record() {
    let (store, _observer, coordinator) = create_test_coordinator();

    let token = coordinator
        .acquire("job:15", &policy(60_000, 10), &CancellationToken::new())
        .await
        .unwrap()
        .detach();

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(
        store.get("job:15").await.unwrap().as_deref(),
        Some(token.as_str())
    );

    // The printed token can still release it later
    let outcome = coordinator.release("job:15", &token).await.unwrap();
    assert_eq!(outcome, ReleaseOutcome::Released);
}

#[tokio::test(start_paused = true)]
async fn test_status_reports_holder_and_ttl() {
    let (_store, _observer, coordinator) = create_test_coordinator();
    assert_eq!(
        coordinator.status("job:16").await.unwrap(),
        LockStatus::Unlocked
    );

    let guard = coordinator
        .acquire("job:16", &policy(2000, 10), &CancellationToken::new())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    let status = coordinator.status("job:16").await.unwrap();
    assert!(status.is_locked());
    assert_eq!(
        status,
        LockStatus::Locked {
            token: guard.token().clone(),
            remaining_ttl: Some(Duration::from_millis(1500)),
        }
    );
    assert!(status.expires_at().is_some());
    assert!(status.to_string().contains("1500ms"));

    guard.release().await.unwrap();
}

#[test]
fn test_policy_defaults() {
    let policy = LockPolicy::default();
    assert_eq!(policy.ttl, Duration::from_millis(6000));
    assert_eq!(policy.retry_interval, Duration::from_millis(50));
    assert_eq!(policy.acquire_timeout, None);
    assert!(policy.validate().is_ok());
}

#[test]
fn test_policy_rejects_sub_millisecond_ttl() {
    let policy = LockPolicy::new(Duration::from_micros(500), Duration::from_millis(50));
    assert!(matches!(
        policy.validate(),
        Err(LockError::InvalidArgument(_))
    ));
}

#[test]
fn test_policy_rejects_zero_acquire_timeout() {
    let policy = LockPolicy::default().with_acquire_timeout(Duration::ZERO);
    assert!(matches!(
        policy.validate(),
        Err(LockError::InvalidArgument(_))
    ));
    assert!(
        LockPolicy::default()
            .with_acquire_timeout(Duration::from_millis(1))
            .validate()
            .is_ok()
    );
}

#[test]
fn test_token_parse() {
    let token = LockToken::parse("  abc-123 ").unwrap();
    assert_eq!(token.as_str(), "abc-123");
    assert!(LockToken::parse("   ").is_err());
}

#[test]
fn test_generated_token_is_uuid() {
    let token = LockToken::generate();
    assert!(uuid::Uuid::parse_str(token.as_str()).is_ok());
}

#[test]
fn test_release_outcome_display() {
    assert_eq!(ReleaseOutcome::Released.to_string(), "released");
    assert_eq!(ReleaseOutcome::NotHeld.to_string(), "not_held");
    assert_eq!(ReleaseOutcome::Foreign.to_string(), "foreign");
    assert_eq!(ReleaseOutcome::Expired.to_string(), "expired");
    assert!(ReleaseOutcome::Released.is_released());
    assert!(!ReleaseOutcome::Expired.is_released());
}

#[test]
fn test_holder_identity_format() {
    let holder = holder_identity();
    assert!(holder.contains('@'));
    assert!(holder.ends_with(&format!(":{}", std::process::id())));
}

#[test]
fn test_event_key_accessor() {
    let event = LockEvent::Contended {
        key: "job:17".to_string(),
        holder: "h".to_string(),
        attempt: 3,
    };
    assert_eq!(event.key(), "job:17");
}
