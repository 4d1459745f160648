//! Periodic pruning of the in-memory counter store.

use crate::PruningConfig;
use chrono::{TimeDelta, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tollgate_rate_limit::InMemoryCounterStore;
use tracing::{debug, info};

/// Prune `store` every `config.interval()` until `shutdown` becomes `true`.
///
/// Events older than `config.horizon()` are dropped. The horizon should be at
/// least the longest configured window or live counts will be lost. Dropping
/// the sender also stops the task.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tokio::sync::watch;
/// use tollgate::{InMemoryCounterStore, PruningConfig, maintenance::spawn_pruner};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = Arc::new(InMemoryCounterStore::new());
/// let (stop, shutdown) = watch::channel(false);
/// let pruner = spawn_pruner(Arc::clone(&store), &PruningConfig::default(), shutdown);
///
/// stop.send(true).unwrap();
/// pruner.await.unwrap();
/// # }
/// ```
pub fn spawn_pruner(
    store: Arc<InMemoryCounterStore>,
    config: &PruningConfig,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let every = config.interval();
    let horizon = i64::try_from(config.horizon().as_secs())
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX);

    tokio::spawn(async move {
        info!(
            interval_secs = every.as_secs(),
            horizon_secs = horizon.num_seconds(),
            "Starting counter store pruner"
        );
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(cutoff) = Utc::now().checked_sub_signed(horizon) else {
                        continue;
                    };
                    let removed = store.prune_older_than(cutoff).await;
                    let keys = store.key_count().await;
                    debug!(removed, keys, "Prune pass complete");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Stopping counter store pruner");
                        break;
                    }
                }
            }
        }
    })
}
