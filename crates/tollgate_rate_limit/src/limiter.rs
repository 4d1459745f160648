//! Sliding-window limiter over a pluggable counter store.
//!
//! The window is computed lazily from raw timestamps at check time rather than
//! from bucketed counters. That costs a scan per check but is exact for the
//! events the store has seen.

use crate::{
    CheckResult, CounterStore, InMemoryCounterStore, RateLimit, RateLimitError,
    RateLimitErrorKind, RateLimitResult, SubjectId,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Per-subject sliding-window rate limiter.
///
/// Holds an immutable map of action name to [`RateLimit`] and a shared
/// [`CounterStore`]. Cloning is cheap and clones share the same store.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use std::sync::Arc;
/// use tollgate_rate_limit::{InMemoryCounterStore, RateLimit, SlidingWindowLimiter, SubjectId};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let limits = HashMap::from([
///     ("chat".to_string(), RateLimit::new(30, 3600)?),
///     ("image".to_string(), RateLimit::new(8, 3600)?),
/// ]);
/// let limiter = SlidingWindowLimiter::new(Arc::new(InMemoryCounterStore::new()), limits);
///
/// let result = limiter.check(SubjectId::new(42), "image").await?;
/// assert_eq!(result.remaining(), 8);
///
/// // Unknown actions are a configuration mistake, not a rate-limit outcome.
/// assert!(limiter.check(SubjectId::new(42), "video").await.is_err());
/// # Ok(())
/// # }
/// ```
pub struct SlidingWindowLimiter<S: CounterStore + ?Sized = InMemoryCounterStore> {
    store: Arc<S>,
    limits: Arc<HashMap<String, RateLimit>>,
}

impl<S: CounterStore + ?Sized> Clone for SlidingWindowLimiter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            limits: Arc::clone(&self.limits),
        }
    }
}

impl<S: CounterStore + ?Sized> std::fmt::Debug for SlidingWindowLimiter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingWindowLimiter")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl<S: CounterStore + ?Sized> SlidingWindowLimiter<S> {
    /// Create a limiter over `store` with one limit per action name.
    pub fn new(store: Arc<S>, limits: HashMap<String, RateLimit>) -> Self {
        debug!(actions = limits.len(), "Creating sliding window limiter");
        Self {
            store,
            limits: Arc::new(limits),
        }
    }

    /// The shared counter store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Configured limit for `action`, if any.
    pub fn limit(&self, action: &str) -> Option<RateLimit> {
        self.limits.get(action).copied()
    }

    /// Names of every configured action.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.limits.keys().map(String::as_str)
    }

    fn configured(&self, action: &str) -> RateLimitResult<RateLimit> {
        self.limit(action).ok_or_else(|| {
            RateLimitError::new(RateLimitErrorKind::UnconfiguredAction(action.to_string()))
        })
    }

    /// Check whether `subject` may perform `action` now.
    ///
    /// Does not record anything. A blocked request is an ordinary
    /// [`CheckResult`] with `is_allowed() == false`.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitErrorKind::UnconfiguredAction`] if `action` has no limit.
    #[instrument(skip(self))]
    pub async fn check(&self, subject: SubjectId, action: &str) -> RateLimitResult<CheckResult> {
        let limit = self.configured(action)?;
        let now = Utc::now();
        let count = self.store.count(subject, action, limit.window_start(now)).await;
        let result = CheckResult::evaluate(&limit, count, now);

        debug!(
            count,
            allowed = result.is_allowed(),
            remaining = result.remaining(),
            "Checked rate limit"
        );
        if !result.is_allowed() {
            info!(
                max_requests = limit.max_requests(),
                wait_seconds = result.wait_seconds(),
                "Subject is rate limited"
            );
        }
        Ok(result)
    }

    /// Record one use of `action` by `subject` at the current instant.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitErrorKind::UnconfiguredAction`] if `action` has no limit.
    #[instrument(skip(self))]
    pub async fn record(&self, subject: SubjectId, action: &str) -> RateLimitResult<()> {
        self.configured(action)?;
        self.store.append(subject, action, Utc::now()).await;
        debug!("Recorded usage");
        Ok(())
    }

    /// Check and record in one step.
    ///
    /// When allowed, the event is recorded immediately and the returned
    /// `remaining` already accounts for it. The slot is not given back if the
    /// downstream call later fails. Atomicity depends on the store's
    /// [`CounterStore::append_if_below`].
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitErrorKind::UnconfiguredAction`] if `action` has no limit.
    #[instrument(skip(self))]
    pub async fn try_acquire(
        &self,
        subject: SubjectId,
        action: &str,
    ) -> RateLimitResult<CheckResult> {
        let limit = self.configured(action)?;
        let now = Utc::now();
        let count = self
            .store
            .append_if_below(
                subject,
                action,
                limit.window_start(now),
                limit.max_requests() as usize,
                now,
            )
            .await;
        let result = if count < limit.max_requests() as usize {
            CheckResult::acquired(&limit, count, now)
        } else {
            CheckResult::evaluate(&limit, count, now)
        };

        debug!(
            count,
            allowed = result.is_allowed(),
            remaining = result.remaining(),
            "Acquired rate limit slot"
        );
        Ok(result)
    }
}
