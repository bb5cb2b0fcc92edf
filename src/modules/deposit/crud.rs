use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{DepositWatch, WatchStatus};
use crate::services::metrics::PollMetricsCollector;
use crate::services::poller::{
    DepositEventSink, DepositStatusPoller, PollerConfig, PollerError, StatusCode,
};
use crate::services::status_provider::StatusProvider;

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Deposit watch {0} not found")]
    NotFound(Uuid),
    #[error("Transaction {0} is already being watched")]
    AlreadyWatching(String),
    #[error(transparent)]
    Poller(#[from] PollerError),
}

type SharedWatch = Arc<Mutex<DepositWatch>>;

fn lock_watch(watch: &Mutex<DepositWatch>) -> MutexGuard<'_, DepositWatch> {
    watch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Event sink bound to one watch record
pub struct WatchRecorder {
    watch: SharedWatch,
}

impl DepositEventSink for WatchRecorder {
    fn on_confirmed(&self) {
        lock_watch(&self.watch).finish(WatchStatus::Confirmed);
    }

    fn on_failed(&self, code: StatusCode) {
        let mut watch = lock_watch(&self.watch);
        if watch.finish(WatchStatus::Failed) {
            watch.failure_code = Some(code);
        }
    }

    fn on_failed_variant(&self, variant: StatusCode) {
        let mut watch = lock_watch(&self.watch);
        if watch.status.is_pending() {
            watch.failure_variant = Some(variant);
        }
    }

    fn on_expired(&self) {
        lock_watch(&self.watch).finish(WatchStatus::Expired);
    }
}

struct WatchEntry {
    watch: SharedWatch,
    poller: DepositStatusPoller,
}

impl WatchEntry {
    /// Record merged with the poller's live counters
    fn snapshot(&self) -> DepositWatch {
        let mut watch = lock_watch(&self.watch).clone();
        if let Some(state) = self.poller.state() {
            watch.attempts = state.attempt_count;
            watch.remaining_attempts = state.remaining_attempts();
            watch.last_status_code = state.last_status;
        }
        watch
    }
}

/// Finished watches are kept for an hour unless configured otherwise
pub const DEFAULT_RETENTION_SECS: i64 = 3_600;

/// In-memory registry of deposit watches, one poller per watch.
/// Finished watches are dropped once they are older than `retention`.
pub struct WatchStore {
    provider: Arc<dyn StatusProvider>,
    metrics: Option<PollMetricsCollector>,
    defaults: PollerConfig,
    retention: Duration,
    watches: RwLock<HashMap<Uuid, WatchEntry>>,
}

impl WatchStore {
    pub fn new(provider: Arc<dyn StatusProvider>, defaults: PollerConfig) -> Self {
        Self {
            provider,
            metrics: None,
            defaults,
            retention: Duration::seconds(DEFAULT_RETENTION_SECS),
            watches: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_metrics(mut self, metrics: PollMetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn defaults(&self) -> PollerConfig {
        self.defaults
    }

    /// Start polling a transaction. Only one pending watch per transaction.
    pub async fn start_watch(
        &self,
        transaction_id: String,
        config: PollerConfig,
    ) -> Result<DepositWatch, WatchError> {
        let max_attempts = config.validate()?;

        let mut watches = self.watches.write().await;
        self.evict_finished(&mut watches);

        let already_watching = watches.values().any(|entry| {
            let watch = lock_watch(&entry.watch);
            watch.transaction_id == transaction_id && watch.status.is_pending()
        });
        if already_watching {
            return Err(WatchError::AlreadyWatching(transaction_id));
        }

        let watch = Arc::new(Mutex::new(DepositWatch::new(
            transaction_id.clone(),
            max_attempts,
            config.poll_interval_ms,
        )));
        let recorder = Arc::new(WatchRecorder {
            watch: watch.clone(),
        });

        let mut poller = DepositStatusPoller::new(self.provider.clone(), recorder);
        if let Some(metrics) = &self.metrics {
            poller = poller.with_metrics(metrics.clone());
        }
        poller.start(transaction_id, config)?;

        let entry = WatchEntry { watch, poller };
        let snapshot = entry.snapshot();
        watches.insert(snapshot.id, entry);

        Ok(snapshot)
    }

    /// Drop finished watches past their retention, pollers included
    fn evict_finished(&self, watches: &mut HashMap<Uuid, WatchEntry>) {
        let now = Utc::now();
        let before = watches.len();
        watches.retain(|_, entry| {
            !lock_watch(&entry.watch).is_expired_record(now, self.retention)
        });

        let evicted = before - watches.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted finished deposit watches");
        }
    }

    pub async fn get(&self, id: Uuid) -> Option<DepositWatch> {
        self.watches.read().await.get(&id).map(WatchEntry::snapshot)
    }

    /// All watches, oldest first
    pub async fn list(&self) -> Vec<DepositWatch> {
        let mut list: Vec<DepositWatch> = self
            .watches
            .read()
            .await
            .values()
            .map(WatchEntry::snapshot)
            .collect();
        list.sort_by_key(|watch| watch.started_at);
        list
    }

    /// Cancel a watch. Stopping a watch that already finished is a no-op.
    pub async fn stop_watch(&self, id: Uuid) -> Result<DepositWatch, WatchError> {
        let watches = self.watches.read().await;
        let entry = watches.get(&id).ok_or(WatchError::NotFound(id))?;

        if entry.poller.stop() {
            lock_watch(&entry.watch).finish(WatchStatus::Cancelled);
        }

        Ok(entry.snapshot())
    }

    /// Stop every poller, used on shutdown
    pub async fn stop_all(&self) {
        for entry in self.watches.read().await.values() {
            if entry.poller.stop() {
                lock_watch(&entry.watch).finish(WatchStatus::Cancelled);
            }
        }
    }
}
