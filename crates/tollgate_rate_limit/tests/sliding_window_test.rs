//! Tests for the sliding-window limiter.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tollgate_rate_limit::{
    CounterStore, InMemoryCounterStore, RateLimit, RateLimitErrorKind, SlidingWindowLimiter,
    SubjectId,
};

const ALICE: SubjectId = SubjectId::new(1);
const BOB: SubjectId = SubjectId::new(2);

fn limiter_with(
    limits: &[(&str, u32, u64)],
) -> (Arc<InMemoryCounterStore>, SlidingWindowLimiter) {
    let store = Arc::new(InMemoryCounterStore::new());
    let limits = limits
        .iter()
        .map(|(action, max, window)| (action.to_string(), RateLimit::new(*max, *window).unwrap()))
        .collect::<HashMap<_, _>>();
    (Arc::clone(&store), SlidingWindowLimiter::new(store, limits))
}

#[tokio::test]
async fn test_allows_within_limit() {
    let (_, limiter) = limiter_with(&[("chat", 10, 3600)]);

    let result = limiter.check(ALICE, "chat").await.unwrap();

    assert!(result.is_allowed());
    assert_eq!(result.remaining(), 10);
    assert_eq!(result.wait_seconds(), None);
}

#[tokio::test]
async fn test_blocks_at_limit() {
    let (store, limiter) = limiter_with(&[("chat", 2, 3600)]);
    let now = Utc::now();
    store.append(ALICE, "chat", now).await;
    store.append(ALICE, "chat", now).await;

    let result = limiter.check(ALICE, "chat").await.unwrap();

    assert!(!result.is_allowed());
    assert_eq!(result.remaining(), 0);
    assert_eq!(result.wait_seconds(), Some(3600));
}

#[tokio::test]
async fn test_one_below_limit_leaves_one_remaining() {
    let (store, limiter) = limiter_with(&[("image", 8, 3600)]);
    let now = Utc::now();
    for _ in 0..7 {
        store.append(ALICE, "image", now - TimeDelta::minutes(30)).await;
    }

    let result = limiter.check(ALICE, "image").await.unwrap();

    assert!(result.is_allowed());
    assert_eq!(result.remaining(), 1);
}

#[tokio::test]
async fn test_record_then_check_scenario() {
    let (_, limiter) = limiter_with(&[("chat", 2, 3600)]);

    let first = limiter.check(ALICE, "chat").await.unwrap();
    assert!(first.is_allowed());
    assert_eq!(first.remaining(), 2);

    limiter.record(ALICE, "chat").await.unwrap();
    limiter.record(ALICE, "chat").await.unwrap();

    let blocked = limiter.check(ALICE, "chat").await.unwrap();
    assert!(!blocked.is_allowed());
    assert_eq!(blocked.remaining(), 0);
    assert_eq!(blocked.wait_seconds(), Some(3600));
}

#[tokio::test]
async fn test_records_decrement_remaining() {
    let (_, limiter) = limiter_with(&[("chat", 10, 3600)]);

    limiter.record(ALICE, "chat").await.unwrap();

    let result = limiter.check(ALICE, "chat").await.unwrap();
    assert_eq!(result.remaining(), 9);
}

#[tokio::test]
async fn test_events_outside_window_do_not_count() {
    let (store, limiter) = limiter_with(&[("chat", 2, 3600)]);
    let now = Utc::now();
    store.append(ALICE, "chat", now - TimeDelta::hours(2)).await;
    store.append(ALICE, "chat", now - TimeDelta::seconds(3601)).await;
    store.append(ALICE, "chat", now).await;

    let result = limiter.check(ALICE, "chat").await.unwrap();

    assert!(result.is_allowed());
    assert_eq!(result.remaining(), 1);
}

#[tokio::test]
async fn test_per_key_isolation() {
    let (_, limiter) = limiter_with(&[("chat", 1, 3600), ("image", 1, 3600)]);

    limiter.record(ALICE, "chat").await.unwrap();

    assert!(!limiter.check(ALICE, "chat").await.unwrap().is_allowed());
    assert!(limiter.check(BOB, "chat").await.unwrap().is_allowed());
    assert!(limiter.check(ALICE, "image").await.unwrap().is_allowed());
}

#[tokio::test]
async fn test_reset_at_is_one_window_ahead() {
    let (_, limiter) = limiter_with(&[("chat", 5, 600)]);
    let before = Utc::now();

    let result = limiter.check(ALICE, "chat").await.unwrap();

    let after = Utc::now();
    assert!(result.reset_at() >= before + TimeDelta::seconds(600));
    assert!(result.reset_at() <= after + TimeDelta::seconds(600));
}

#[tokio::test]
async fn test_wait_is_full_window_even_when_oldest_event_is_old() {
    let (store, limiter) = limiter_with(&[("chat", 1, 3600)]);
    store
        .append(ALICE, "chat", Utc::now() - TimeDelta::minutes(59))
        .await;

    let result = limiter.check(ALICE, "chat").await.unwrap();

    assert_eq!(result.wait_seconds(), Some(3600));
}

#[tokio::test]
async fn test_unconfigured_action_is_an_error() {
    let (_, limiter) = limiter_with(&[("chat", 2, 3600)]);

    let check = limiter.check(ALICE, "video").await.unwrap_err();
    assert!(
        matches!(check.kind(), RateLimitErrorKind::UnconfiguredAction(action) if action == "video")
    );

    let record = limiter.record(ALICE, "video").await.unwrap_err();
    assert!(matches!(record.kind(), RateLimitErrorKind::UnconfiguredAction(_)));
}

#[tokio::test]
async fn test_check_does_not_record() {
    let (store, limiter) = limiter_with(&[("chat", 2, 3600)]);

    for _ in 0..5 {
        limiter.check(ALICE, "chat").await.unwrap();
    }

    assert_eq!(store.event_count(ALICE, "chat").await, 0);
}

#[tokio::test]
async fn test_try_acquire_records_when_allowed() {
    let (store, limiter) = limiter_with(&[("chat", 2, 3600)]);

    let first = limiter.try_acquire(ALICE, "chat").await.unwrap();
    assert!(first.is_allowed());
    assert_eq!(first.remaining(), 1);

    let second = limiter.try_acquire(ALICE, "chat").await.unwrap();
    assert!(second.is_allowed());
    assert_eq!(second.remaining(), 0);

    let third = limiter.try_acquire(ALICE, "chat").await.unwrap();
    assert!(!third.is_allowed());
    assert_eq!(third.wait_seconds(), Some(3600));

    assert_eq!(store.event_count(ALICE, "chat").await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_try_acquire_never_exceeds_limit_under_contention() {
    let (store, limiter) = limiter_with(&[("image", 5, 3600)]);

    let handles: Vec<_> = (0..40)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.try_acquire(ALICE, "image").await.unwrap() })
        })
        .collect();

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap().is_allowed() {
            admitted += 1;
        }
    }

    assert_eq!(admitted, 5);
    assert_eq!(store.event_count(ALICE, "image").await, 5);
}

#[tokio::test]
async fn test_works_over_trait_object_store() {
    let store: Arc<dyn CounterStore> = Arc::new(InMemoryCounterStore::new());
    let limits = HashMap::from([("chat".to_string(), RateLimit::new(1, 60).unwrap())]);
    let limiter: SlidingWindowLimiter<dyn CounterStore> = SlidingWindowLimiter::new(store, limits);

    limiter.record(ALICE, "chat").await.unwrap();

    assert!(!limiter.check(ALICE, "chat").await.unwrap().is_allowed());
}

#[test]
fn test_rate_limit_rejects_zero_values() {
    assert!(matches!(
        RateLimit::new(0, 60).unwrap_err().kind(),
        RateLimitErrorKind::InvalidLimit(_)
    ));
    assert!(matches!(
        RateLimit::new(5, 0).unwrap_err().kind(),
        RateLimitErrorKind::InvalidLimit(_)
    ));
    assert!(RateLimit::new(5, u64::MAX).is_err());
}

#[tokio::test]
async fn test_huge_window_saturates_instead_of_overflowing() {
    let (_, limiter) = limiter_with(&[("chat", 1, 10_000_000_000_000)]);

    let first = limiter.check(ALICE, "chat").await.unwrap();
    assert!(first.is_allowed());
    assert_eq!(first.reset_at(), DateTime::<Utc>::MAX_UTC);

    limiter.record(ALICE, "chat").await.unwrap();
    let blocked = limiter.check(ALICE, "chat").await.unwrap();
    assert!(!blocked.is_allowed());
    assert_eq!(blocked.wait_seconds(), Some(10_000_000_000_000));

    assert!(!limiter.try_acquire(ALICE, "chat").await.unwrap().is_allowed());
}

#[test]
fn test_window_bounds_clamp_to_representable_range() {
    let limit = RateLimit::new(1, 10_000_000_000_000).unwrap();
    let now = Utc::now();

    assert_eq!(limit.window_start(now), DateTime::<Utc>::MIN_UTC);
    assert_eq!(limit.window_end(now), DateTime::<Utc>::MAX_UTC);

    let hourly = RateLimit::new(1, 3600).unwrap();
    assert_eq!(hourly.window_start(now), now - TimeDelta::hours(1));
    assert_eq!(hourly.window_end(now), now + TimeDelta::hours(1));
}
