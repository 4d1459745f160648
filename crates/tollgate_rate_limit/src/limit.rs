//! Value types shared by the limiter and its stores.

use crate::{RateLimitError, RateLimitErrorKind, RateLimitResult};
use chrono::{DateTime, TimeDelta, Utc};

/// Identity a rate limit is scoped to, typically a user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display, derive_more::From,
)]
pub struct SubjectId(u64);

impl SubjectId {
    /// Wrap a raw identifier.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Request ceiling for one named action.
///
/// Immutable once built. Both values must be positive.
///
/// # Example
///
/// ```
/// use tollgate_rate_limit::RateLimit;
///
/// let chat = RateLimit::new(30, 3600).unwrap();
/// assert_eq!(chat.max_requests(), 30);
/// assert!(RateLimit::new(0, 3600).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RateLimit {
    max_requests: u32,
    window_seconds: u64,
}

impl RateLimit {
    /// Create a limit of `max_requests` per `window_seconds`.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitErrorKind::InvalidLimit`] if either value is zero or
    /// the window does not fit in a timestamp offset.
    #[track_caller]
    pub fn new(max_requests: u32, window_seconds: u64) -> RateLimitResult<Self> {
        if max_requests == 0 {
            return Err(RateLimitError::new(RateLimitErrorKind::InvalidLimit(
                "max_requests must be greater than 0".to_string(),
            )));
        }
        if window_seconds == 0 {
            return Err(RateLimitError::new(RateLimitErrorKind::InvalidLimit(
                "window_seconds must be greater than 0".to_string(),
            )));
        }
        if i64::try_from(window_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .is_none()
        {
            return Err(RateLimitError::new(RateLimitErrorKind::InvalidLimit(format!(
                "window_seconds {} is out of range",
                window_seconds
            ))));
        }
        Ok(Self {
            max_requests,
            window_seconds,
        })
    }

    /// Maximum requests allowed in one window.
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Window length in seconds.
    pub fn window_seconds(&self) -> u64 {
        self.window_seconds
    }

    /// Window length as a timestamp offset.
    pub fn window(&self) -> TimeDelta {
        // Range is checked in `new`.
        TimeDelta::seconds(self.window_seconds as i64)
    }

    /// Start of the window ending at `now`, clamped to the earliest representable instant.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.window())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// End of a window starting at `now`, clamped to the latest representable instant.
    pub fn window_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.window())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Outcome of a limiter check.
///
/// Derived on every call and never stored. `wait_seconds` is present only when
/// the request is blocked, and is always the full window length rather than the
/// time until the oldest event in the window expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    allowed: bool,
    remaining: u32,
    reset_at: DateTime<Utc>,
    wait_seconds: Option<u64>,
}

impl CheckResult {
    /// Evaluate `limit` against `count` events observed in the window ending at `now`.
    pub(crate) fn evaluate(limit: &RateLimit, count: usize, now: DateTime<Utc>) -> Self {
        let max = limit.max_requests as usize;
        let allowed = count < max;
        Self {
            allowed,
            // Bounded by max_requests, which is a u32.
            remaining: max.saturating_sub(count) as u32,
            reset_at: limit.window_end(now),
            wait_seconds: (!allowed).then_some(limit.window_seconds),
        }
    }

    /// Result for a request admitted and recorded on top of `count` prior events.
    pub(crate) fn acquired(limit: &RateLimit, count: usize, now: DateTime<Utc>) -> Self {
        let max = limit.max_requests as usize;
        Self {
            allowed: true,
            remaining: max.saturating_sub(count + 1) as u32,
            reset_at: limit.window_end(now),
            wait_seconds: None,
        }
    }

    /// Whether the request may proceed.
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// Requests left in the current window.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// When the current window ends, measured from the check.
    pub fn reset_at(&self) -> DateTime<Utc> {
        self.reset_at
    }

    /// Seconds the caller should wait before trying again, if blocked.
    pub fn wait_seconds(&self) -> Option<u64> {
        self.wait_seconds
    }

    /// Message suitable for end users when the request is blocked.
    ///
    /// # Example
    ///
    /// ```
    /// # use std::collections::HashMap;
    /// # use std::sync::Arc;
    /// # use tollgate_rate_limit::*;
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// # let limits = HashMap::from([("image".to_string(), RateLimit::new(1, 3600).unwrap())]);
    /// # let limiter = SlidingWindowLimiter::new(Arc::new(InMemoryCounterStore::new()), limits);
    /// # let user = SubjectId::new(7);
    /// limiter.record(user, "image").await.unwrap();
    /// let result = limiter.check(user, "image").await.unwrap();
    /// assert_eq!(
    ///     result.user_message("image"),
    ///     "You're sending too many image requests. Try again in 3600 seconds."
    /// );
    /// # }
    /// ```
    pub fn user_message(&self, action: &str) -> String {
        match self.wait_seconds {
            Some(wait) => format!(
                "You're sending too many {} requests. Try again in {} seconds.",
                action, wait
            ),
            None => format!("You're sending too many {} requests.", action),
        }
    }
}
