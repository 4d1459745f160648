//! Process-local counter store.

use crate::{CounterStore, SubjectId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

type Events = HashMap<SubjectId, HashMap<String, Vec<DateTime<Utc>>>>;

/// In-memory [`CounterStore`] guarded by a single lock.
///
/// Suitable for a single process. Counts are lost on restart and memory grows
/// with usage until [`prune_older_than`](Self::prune_older_than) is called by
/// some external scheduler.
///
/// Counting is a linear scan over the key's events, which stays cheap while
/// windows are short and per-subject volume is small.
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    events: Mutex<Events>,
}

impl InMemoryCounterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every recorded event.
    #[instrument(skip(self))]
    pub async fn clear(&self) {
        self.events.lock().await.clear();
        debug!("Cleared counter store");
    }

    /// Drop events strictly before `cutoff`, and any key left empty.
    ///
    /// Returns the number of events removed.
    #[instrument(skip(self))]
    pub async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let mut events = self.events.lock().await;
        let mut removed = 0;
        events.retain(|_, actions| {
            actions.retain(|_, timestamps| {
                let before = timestamps.len();
                timestamps.retain(|ts| *ts >= cutoff);
                removed += before - timestamps.len();
                !timestamps.is_empty()
            });
            !actions.is_empty()
        });
        debug!(removed, "Pruned counter store");
        removed
    }

    /// Number of `(subject, action)` keys currently held.
    pub async fn key_count(&self) -> usize {
        self.events.lock().await.values().map(HashMap::len).sum()
    }

    /// Total events held for one key, regardless of age.
    pub async fn event_count(&self, subject: SubjectId, action: &str) -> usize {
        self.events
            .lock()
            .await
            .get(&subject)
            .and_then(|actions| actions.get(action))
            .map_or(0, Vec::len)
    }
}

fn count_since(events: &Events, subject: SubjectId, action: &str, since: DateTime<Utc>) -> usize {
    events
        .get(&subject)
        .and_then(|actions| actions.get(action))
        .map_or(0, |timestamps| timestamps.iter().filter(|ts| **ts >= since).count())
}

fn push(events: &mut Events, subject: SubjectId, action: &str, at: DateTime<Utc>) {
    events
        .entry(subject)
        .or_default()
        .entry(action.to_string())
        .or_default()
        .push(at);
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn count(&self, subject: SubjectId, action: &str, since: DateTime<Utc>) -> usize {
        count_since(&*self.events.lock().await, subject, action, since)
    }

    async fn append(&self, subject: SubjectId, action: &str, at: DateTime<Utc>) {
        push(&mut *self.events.lock().await, subject, action, at);
    }

    async fn append_if_below(
        &self,
        subject: SubjectId,
        action: &str,
        since: DateTime<Utc>,
        max: usize,
        at: DateTime<Utc>,
    ) -> usize {
        // Count and append under one lock so concurrent callers cannot both slip in.
        let mut events = self.events.lock().await;
        let count = count_since(&events, subject, action, since);
        if count < max {
            push(&mut events, subject, action, at);
        }
        count
    }
}
