//! Check, call, record.

use crate::TollgateConfig;
use std::error::Error;
use std::future::Future;
use tollgate_error::TollgateResult;
use tollgate_rate_limit::{
    CheckResult, CounterStore, InMemoryCounterStore, SlidingWindowLimiter, SubjectId,
};
use tollgate_retry::{RetryPolicy, run, submit_then_poll};
use tracing::{debug, instrument};

/// Outcome of a gated call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission<T> {
    /// The limiter refused; the operation was never invoked.
    Blocked(CheckResult),
    /// The operation ran and its usage was recorded.
    Completed(T),
}

impl<T> Admission<T> {
    /// Returns true if the limiter refused the call.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Admission::Blocked(_))
    }

    /// The operation's value, if it ran.
    pub fn completed(self) -> Option<T> {
        match self {
            Admission::Completed(value) => Some(value),
            Admission::Blocked(_) => None,
        }
    }
}

/// Limiter and retry policy applied together around a downstream call.
///
/// Usage is recorded only after the call succeeds, so failed or refused
/// calls do not count against the subject. This inherits the check/record
/// race: concurrent calls for one subject can overshoot the limit by the
/// number in flight.
pub struct Gate<S: CounterStore + ?Sized = InMemoryCounterStore> {
    limiter: SlidingWindowLimiter<S>,
    policy: RetryPolicy,
}

impl<S: CounterStore + ?Sized> Clone for Gate<S> {
    fn clone(&self) -> Self {
        Self {
            limiter: self.limiter.clone(),
            policy: self.policy.clone(),
        }
    }
}

impl<S: CounterStore + ?Sized> std::fmt::Debug for Gate<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("limiter", &self.limiter)
            .field("policy", &self.policy)
            .finish()
    }
}

impl Gate {
    /// Build a gate over a fresh in-memory store.
    ///
    /// # Errors
    ///
    /// Returns the configuration error for any invalid limit or retry setting.
    pub fn from_config(config: &TollgateConfig) -> TollgateResult<Self> {
        Ok(Self::new(config.limiter()?, config.retry_policy()?))
    }
}

impl<S: CounterStore + ?Sized> Gate<S> {
    /// Pair a limiter with a retry policy.
    pub fn new(limiter: SlidingWindowLimiter<S>, policy: RetryPolicy) -> Self {
        Self { limiter, policy }
    }

    /// The underlying limiter.
    pub fn limiter(&self) -> &SlidingWindowLimiter<S> {
        &self.limiter
    }

    /// The retry policy applied to every call.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` for `subject` if `action` is within its limit.
    ///
    /// # Errors
    ///
    /// Returns the limiter error for an unconfigured action, or the
    /// [`RetryError`](tollgate_error::RetryError) if the operation failed.
    #[instrument(skip(self, operation))]
    pub async fn call<T, E, F, Fut>(
        &self,
        subject: SubjectId,
        action: &str,
        operation: F,
    ) -> TollgateResult<Admission<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + Send + Sync + 'static,
    {
        let check = self.limiter.check(subject, action).await?;
        if !check.is_allowed() {
            return Ok(Admission::Blocked(check));
        }

        let value = run(&self.policy, operation).await?;
        self.limiter.record(subject, action).await?;
        debug!("Gated call completed");
        Ok(Admission::Completed(value))
    }

    /// Two-phase variant of [`call`](Self::call): submit once, poll with retries.
    ///
    /// # Errors
    ///
    /// As for [`call`](Self::call), with submission failures reported as
    /// [`RetryErrorKind::SubmitFailed`](tollgate_error::RetryErrorKind::SubmitFailed).
    #[instrument(skip(self, submit, poll))]
    pub async fn call_two_phase<H, T, SE, PE, Sub, SFut, P, PFut>(
        &self,
        subject: SubjectId,
        action: &str,
        submit: Sub,
        poll: P,
    ) -> TollgateResult<Admission<T>>
    where
        H: Clone,
        Sub: FnOnce() -> SFut,
        SFut: Future<Output = Result<H, SE>>,
        SE: Error + Send + Sync + 'static,
        P: FnMut(H) -> PFut,
        PFut: Future<Output = Result<T, PE>>,
        PE: Error + Send + Sync + 'static,
    {
        let check = self.limiter.check(subject, action).await?;
        if !check.is_allowed() {
            return Ok(Admission::Blocked(check));
        }

        let value = submit_then_poll(&self.policy, submit, poll).await?;
        self.limiter.record(subject, action).await?;
        debug!("Gated two-phase call completed");
        Ok(Admission::Completed(value))
    }
}
