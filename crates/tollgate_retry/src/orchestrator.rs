//! Bounded retry loop built on `tokio-retry2`.

use crate::{RetryPolicy, classify, is_cancellation};
use std::error::Error;
use std::future::Future;
use std::time::Duration;
use tokio_retry2::{Retry, RetryError as Attempt};
use tollgate_error::RetryError;
use tracing::{debug, error, instrument, warn};

/// Run `operation`, retrying transient failures according to `policy`.
///
/// The operation is invoked at most `max_retries + 1` times. Success returns
/// immediately. A non-retryable failure returns [`RetryError::permanent`]
/// after a single invocation. A retryable failure on the last attempt
/// returns [`RetryError::transient`]. Cancellation signals are never retried.
///
/// Sleeps use the tokio timer, so dropping the returned future cancels the
/// loop mid-backoff without another attempt.
///
/// # Errors
///
/// Returns a [`RetryError`] wrapping the last failure.
#[instrument(skip_all, fields(max_retries = policy.max_retries()))]
pub async fn run<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Error + Send + Sync + 'static,
{
    let max_retries = *policy.max_retries();
    let mut attempt: u32 = 0;

    Retry::spawn(policy.backoff(), || {
        let current = attempt;
        attempt += 1;
        let delay = policy.delay_for(current);
        let call = operation();
        async move {
            call.await
                .map_err(|err| decide(err, current, max_retries, delay))
        }
    })
    .await
}

/// Retry the idempotent poll step of a two-phase operation.
///
/// Identical to [`run`]; exists so call sites state which phase is retried.
///
/// # Errors
///
/// Returns a [`RetryError`] wrapping the last poll failure.
#[instrument(skip_all, name = "run_poll")]
pub async fn run_poll<T, E, F, Fut>(policy: &RetryPolicy, poll: F) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Error + Send + Sync + 'static,
{
    run(policy, poll).await
}

/// Submit once, then poll for the result under `policy`.
///
/// `submit` is billable and is never retried: any failure returns
/// [`RetryError::submit_failed`] carrying its category, or a cancellation.
/// The handle it yields is passed to every `poll` invocation.
///
/// # Example
///
/// ```
/// use std::io;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
/// use tollgate_retry::{submit_then_poll, RetryPolicy};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let policy = RetryPolicy::default().with_base_delay(Duration::from_millis(1));
/// let polls = AtomicU32::new(0);
///
/// let image = submit_then_poll(
///     &policy,
///     || async { Ok::<_, io::Error>("req-17".to_string()) },
///     |id| {
///         let n = polls.fetch_add(1, Ordering::SeqCst);
///         async move {
///             if n == 0 {
///                 Err(io::Error::other("503 Service Unavailable"))
///             } else {
///                 Ok(format!("{id}.png"))
///             }
///         }
///     },
/// )
/// .await
/// .unwrap();
///
/// assert_eq!(image, "req-17.png");
/// # }
/// ```
///
/// # Errors
///
/// Returns a [`RetryError`] for a failed submission or the last poll failure.
#[instrument(skip_all, fields(max_retries = policy.max_retries()))]
pub async fn submit_then_poll<H, T, SE, PE, S, SFut, P, PFut>(
    policy: &RetryPolicy,
    submit: S,
    mut poll: P,
) -> Result<T, RetryError>
where
    H: Clone,
    S: FnOnce() -> SFut,
    SFut: Future<Output = Result<H, SE>>,
    SE: Error + Send + Sync + 'static,
    P: FnMut(H) -> PFut,
    PFut: Future<Output = Result<T, PE>>,
    PE: Error + Send + Sync + 'static,
{
    let handle = submit().await.map_err(|err| {
        if is_cancellation(&err) {
            debug!("Submission cancelled");
            return RetryError::cancelled(err);
        }
        let category = classify(&err);
        warn!(%category, error = %err, "submit_failed");
        RetryError::submit_failed(category, err)
    })?;
    debug!("Submitted, polling for result");

    run_poll(policy, || poll(handle.clone())).await
}

fn decide<E>(err: E, attempt: u32, max_retries: u32, delay: Duration) -> Attempt<RetryError>
where
    E: Error + Send + Sync + 'static,
{
    if is_cancellation(&err) {
        debug!(attempt = attempt + 1, "Operation cancelled");
        return Attempt::Permanent(RetryError::cancelled(err));
    }

    let category = classify(&err);
    if !category.is_retryable() {
        warn!(%category, error = %err, "permanent_error");
        return Attempt::Permanent(RetryError::permanent(category, err));
    }

    let attempts = attempt + 1;
    if attempt >= max_retries {
        error!(%category, attempts, error = %err, "max_retries_exceeded");
        return Attempt::Permanent(RetryError::transient(category, attempts, err));
    }

    warn!(
        %category,
        attempt = attempts,
        max_retries,
        delay_seconds = delay.as_secs_f64(),
        error = %err,
        "retrying_after_error"
    );
    Attempt::Transient {
        err: RetryError::transient(category, attempts, err),
        retry_after: None,
    }
}
