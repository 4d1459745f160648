//! Retry budget and backoff schedule.

use derive_getters::Getters;
use std::time::Duration;
use tollgate_error::ConfigError;

/// How many times to retry and how long to wait in between.
///
/// Read-only once handed to [`run`](crate::run). Delays grow exponentially
/// from `base_delay` by `backoff_multiplier` and are capped at `max_delay`.
/// No jitter is applied.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tollgate_retry::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// let delays: Vec<_> = policy.backoff().collect();
/// assert_eq!(
///     delays,
///     vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct RetryPolicy {
    /// Retries after the first attempt
    max_retries: u32,
    /// Delay before the first retry
    base_delay: Duration,
    /// Ceiling for any single delay
    max_delay: Duration,
    /// Growth factor between consecutive delays
    backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Build a policy from its four parameters.
    pub fn new(
        max_retries: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            backoff_multiplier,
        }
    }

    /// Reject parameters that would not produce a growing, bounded schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.backoff_multiplier.is_finite() {
            return Err(ConfigError::invalid(
                "retry.backoff_multiplier",
                "must be a finite number",
            ));
        }
        if self.backoff_multiplier <= 1.0 {
            return Err(ConfigError::invalid(
                "retry.backoff_multiplier",
                format!("must be greater than 1, got {}", self.backoff_multiplier),
            ));
        }
        if self.max_delay < self.base_delay {
            return Err(ConfigError::invalid(
                "retry.max_delay",
                format!(
                    "must not be shorter than base_delay ({:?} < {:?})",
                    self.max_delay, self.base_delay
                ),
            ));
        }
        Ok(())
    }

    /// Delay to sleep after the zero-based `attempt` fails.
    ///
    /// ```
    /// use std::time::Duration;
    /// use tollgate_retry::RetryPolicy;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.delay_for(0), Duration::from_secs(1));
    /// assert_eq!(policy.delay_for(10), Duration::from_secs(30));
    /// ```
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs).map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// The full sleep schedule, one delay per retry.
    pub fn backoff(&self) -> Backoff {
        Backoff {
            policy: self.clone(),
            attempt: 0,
        }
    }
}

/// Iterator over the delays of a [`RetryPolicy`].
///
/// Yields exactly `max_retries` items.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: RetryPolicy,
    attempt: u32,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.attempt >= self.policy.max_retries {
            return None;
        }
        let delay = self.policy.delay_for(self.attempt);
        self.attempt += 1;
        Some(delay)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.policy.max_retries.saturating_sub(self.attempt) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Backoff {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_are_capped() {
        let policy = RetryPolicy::new(6, Duration::from_secs(5), Duration::from_secs(30), 3.0);
        let delays: Vec<u64> = policy.backoff().map(|d| d.as_secs()).collect();
        assert_eq!(delays, vec![5, 15, 30, 30, 30, 30]);
    }

    #[test]
    fn test_zero_retries_has_empty_schedule() {
        let policy = RetryPolicy::default().with_max_retries(0);
        assert_eq!(policy.backoff().len(), 0);
    }

    #[test]
    fn test_huge_attempt_saturates_to_ceiling() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn test_validate() {
        assert!(RetryPolicy::default().validate().is_ok());
        assert!(RetryPolicy::default().with_backoff_multiplier(1.0).validate().is_err());
        assert!(RetryPolicy::default().with_backoff_multiplier(f64::NAN).validate().is_err());
        assert!(
            RetryPolicy::default()
                .with_max_delay(Duration::from_millis(500))
                .validate()
                .is_err()
        );
    }
}
