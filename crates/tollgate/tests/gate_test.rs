use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tollgate::{
    Admission, ErrorCategory, Gate, InMemoryCounterStore, ProviderError, ProviderErrorKind,
    RateLimit, RetryErrorKind, RetryPolicy, SlidingWindowLimiter, SubjectId, TollgateErrorKind,
};

const USER: SubjectId = SubjectId::new(11);

fn gate(max_requests: u32) -> (Arc<InMemoryCounterStore>, Gate) {
    let store = Arc::new(InMemoryCounterStore::new());
    let limits = [
        ("chat".to_string(), RateLimit::new(max_requests, 3600).unwrap()),
        ("image".to_string(), RateLimit::new(max_requests, 3600).unwrap()),
    ]
    .into_iter()
    .collect();
    let limiter = SlidingWindowLimiter::new(Arc::clone(&store), limits);
    (store, Gate::new(limiter, RetryPolicy::default()))
}

#[tokio::test(start_paused = true)]
async fn test_success_is_recorded() {
    let (store, gate) = gate(2);

    let outcome = gate
        .call(USER, "chat", || async { Ok::<_, io::Error>("reply") })
        .await
        .unwrap();

    assert_eq!(outcome.completed(), Some("reply"));
    assert_eq!(store.event_count(USER, "chat").await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_blocked_call_never_runs() {
    let (_, gate) = gate(1);
    let calls = AtomicU32::new(0);
    let op = || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, io::Error>(()) }
    };

    gate.call(USER, "chat", op).await.unwrap();
    let outcome = gate.call(USER, "chat", op).await.unwrap();

    let Admission::Blocked(check) = outcome else {
        panic!("second call should be blocked");
    };
    assert_eq!(check.remaining(), 0);
    assert_eq!(check.wait_seconds(), Some(3600));
    assert_eq!(
        check.user_message("chat"),
        "You're sending too many chat requests. Try again in 3600 seconds."
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failure_is_not_recorded() {
    let (store, gate) = gate(2);

    let err = gate
        .call(USER, "chat", || async {
            Err::<(), _>(ProviderError::new(
                "anthropic",
                ProviderErrorKind::Api("invalid prompt".into()),
            ))
        })
        .await
        .unwrap_err();

    let TollgateErrorKind::Retry(retry) = err.kind() else {
        panic!("expected retry error, got {err}");
    };
    assert_eq!(retry.category(), Some(ErrorCategory::InvalidInput));
    assert_eq!(store.event_count(USER, "chat").await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_is_retried_then_recorded() {
    let (store, gate) = gate(2);
    let calls = AtomicU32::new(0);

    let outcome = gate
        .call(USER, "chat", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ProviderError::new(
                        "anthropic",
                        ProviderErrorKind::Http {
                            status_code: 529,
                            message: "Overloaded".into(),
                        },
                    ))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(outcome, Admission::Completed(2));
    assert_eq!(store.event_count(USER, "chat").await, 1);
}

#[tokio::test]
async fn test_unconfigured_action_is_an_error() {
    let (_, gate) = gate(2);

    let err = gate
        .call(USER, "video", || async { Ok::<_, io::Error>(()) })
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), TollgateErrorKind::RateLimit(_)));
}

#[tokio::test(start_paused = true)]
async fn test_two_phase_submits_once_and_records() {
    let (store, gate) = gate(8);
    let submits = AtomicU32::new(0);
    let polls = AtomicU32::new(0);

    let outcome = gate
        .call_two_phase(
            USER,
            "image",
            || {
                submits.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, io::Error>("req-9".to_string()) }
            },
            |id| {
                let n = polls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(io::Error::new(io::ErrorKind::TimedOut, "poll timed out"))
                    } else {
                        Ok(format!("{id}.png"))
                    }
                }
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.completed().as_deref(), Some("req-9.png"));
    assert_eq!(submits.load(Ordering::SeqCst), 1);
    assert_eq!(polls.load(Ordering::SeqCst), 2);
    assert_eq!(store.event_count(USER, "image").await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_two_phase_submit_failure_is_surfaced() {
    let (store, gate) = gate(8);

    let err = gate
        .call_two_phase(
            USER,
            "image",
            || async { Err::<String, _>(io::Error::other("503 Service Unavailable")) },
            |_id| async { Ok::<_, io::Error>(()) },
        )
        .await
        .unwrap_err();

    let TollgateErrorKind::Retry(retry) = err.kind() else {
        panic!("expected retry error, got {err}");
    };
    assert!(matches!(retry.kind(), RetryErrorKind::SubmitFailed { .. }));
    assert_eq!(store.event_count(USER, "image").await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_report_busy() {
    let (_, gate) = gate(2);
    let start = tokio::time::Instant::now();

    let err = gate
        .call(USER, "chat", || async {
            Err::<(), _>(io::Error::from(io::ErrorKind::ConnectionRefused))
        })
        .await
        .unwrap_err();

    let TollgateErrorKind::Retry(retry) = err.into_kind() else {
        panic!("expected retry error");
    };
    assert!(retry.is_transient());
    assert!(retry.user_message().contains("try again"));
    assert_eq!(tokio::time::Instant::now() - start, Duration::from_secs(7));
}
