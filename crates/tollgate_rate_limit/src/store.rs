//! Counter storage abstraction.

use crate::SubjectId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Storage of timestamped usage events keyed by `(subject, action)`.
///
/// The limiter only ever counts and appends. Implementations must not fail
/// for unknown keys and have no capacity limit at this layer.
///
/// # Example
///
/// A store that forwards to a shared external counter service would implement
/// this trait and be handed to [`SlidingWindowLimiter::new`](crate::SlidingWindowLimiter::new)
/// in place of [`InMemoryCounterStore`](crate::InMemoryCounterStore).
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Number of events for the key with a timestamp at or after `since`.
    ///
    /// Must not mutate state. Returns 0 for unknown keys.
    async fn count(&self, subject: SubjectId, action: &str, since: DateTime<Utc>) -> usize;

    /// Record one event at `at`. Duplicate timestamps are permitted.
    async fn append(&self, subject: SubjectId, action: &str, at: DateTime<Utc>);

    /// Record an event at `at` only if fewer than `max` events fall at or after `since`.
    ///
    /// Returns the count observed before appending. The default implementation
    /// counts and then appends as two separate steps, so it is not atomic;
    /// stores that can do better should override it.
    async fn append_if_below(
        &self,
        subject: SubjectId,
        action: &str,
        since: DateTime<Utc>,
        max: usize,
        at: DateTime<Utc>,
    ) -> usize {
        let count = self.count(subject, action, since).await;
        if count < max {
            self.append(subject, action, at).await;
        }
        count
    }
}
