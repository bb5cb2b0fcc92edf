use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use super::config::PollerConfig;
use super::events::DepositEventSink;
use super::state::PollState;
use super::status::{DepositStatus, StatusCode};
use super::PollerError;
use crate::services::metrics::PollMetricsCollector;
use crate::services::status_provider::{StatusFetchError, StatusProvider};

/// Terminal outcome of a watch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Confirmed,
    Failed {
        code: StatusCode,
        variant: Option<StatusCode>,
    },
    Expired,
}

impl PollOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Failed { .. } => "failed",
            Self::Expired => "expired",
        }
    }

    fn emit(&self, events: &dyn DepositEventSink) {
        match *self {
            Self::Confirmed => events.on_confirmed(),
            Self::Failed { code, variant } => {
                if let Some(variant) = variant {
                    events.on_failed_variant(variant);
                }
                events.on_failed(code);
            }
            Self::Expired => events.on_expired(),
        }
    }
}

struct Session {
    state: Arc<Mutex<PollState>>,
    cancel: watch::Sender<bool>,
    _task: JoinHandle<()>,
}

/// Polls a status provider for one pending deposit until it is confirmed,
/// fails, or runs out of attempts.
///
/// Ticks are strictly sequential: the next tick is only scheduled once the
/// current status request has settled. Transport errors consume an attempt,
/// so a provider that never answers ends in `on_expired`.
///
/// `start` spawns a tokio task and must be called from within a runtime.
/// Dropping the poller stops it.
pub struct DepositStatusPoller {
    provider: Arc<dyn StatusProvider>,
    events: Arc<dyn DepositEventSink>,
    metrics: Option<PollMetricsCollector>,
    session: Option<Session>,
}

impl DepositStatusPoller {
    pub fn new(provider: Arc<dyn StatusProvider>, events: Arc<dyn DepositEventSink>) -> Self {
        Self {
            provider,
            events,
            metrics: None,
            session: None,
        }
    }

    pub fn with_metrics(mut self, metrics: PollMetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Begin polling `transaction_id`. Fails without touching the provider
    /// if the config is invalid or this poller was already started.
    pub fn start(
        &mut self,
        transaction_id: impl Into<String>,
        config: PollerConfig,
    ) -> Result<(), PollerError> {
        let transaction_id = transaction_id.into();
        let max_attempts = config.validate()?;

        if let Some(session) = &self.session {
            let current = lock_state(&session.state).transaction_id.clone();
            return Err(PollerError::AlreadyStarted(current));
        }

        let state = Arc::new(Mutex::new(PollState::new(transaction_id.clone(), max_attempts)));
        let (cancel, cancel_rx) = watch::channel(false);

        tracing::info!(
            transaction_id = %transaction_id,
            interval_ms = config.poll_interval_ms,
            max_attempts,
            "Deposit polling started"
        );

        if let Some(metrics) = &self.metrics {
            metrics.watch_started();
        }

        let task = tokio::spawn(poll_loop(
            self.provider.clone(),
            self.events.clone(),
            self.metrics.clone(),
            state.clone(),
            cancel_rx,
            config.poll_interval(),
        ));

        self.session = Some(Session {
            state,
            cancel,
            _task: task,
        });

        Ok(())
    }

    /// Stop polling without emitting anything. Idempotent; a request that is
    /// in flight is dropped and its result discarded.
    ///
    /// Returns true if this call ended an active poll, false if the poller
    /// was never started or had already reached a terminal state.
    pub fn stop(&self) -> bool {
        let Some(session) = &self.session else {
            return false;
        };

        let stopped = {
            let mut state = lock_state(&session.state);
            if state.terminal {
                false
            } else {
                state.terminal = true;
                tracing::info!(
                    transaction_id = %state.transaction_id,
                    attempts = state.attempt_count,
                    "Deposit polling stopped"
                );
                true
            }
        };

        // Receiver is gone once the loop has exited
        let _ = session.cancel.send(true);
        stopped
    }

    /// Snapshot of the current poll state, `None` before `start`
    pub fn state(&self) -> Option<PollState> {
        self.session
            .as_ref()
            .map(|session| lock_state(&session.state).clone())
    }

    pub fn is_terminal(&self) -> bool {
        self.state().map(|state| state.terminal).unwrap_or(false)
    }
}

impl Drop for DepositStatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock_state(state: &Mutex<PollState>) -> MutexGuard<'_, PollState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Resolves once `stop` was called or the poller was dropped
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            return;
        }
    }
}

async fn poll_loop(
    provider: Arc<dyn StatusProvider>,
    events: Arc<dyn DepositEventSink>,
    metrics: Option<PollMetricsCollector>,
    state: Arc<Mutex<PollState>>,
    mut cancel: watch::Receiver<bool>,
    period: Duration,
) {
    let transaction_id = lock_state(&state).transaction_id.clone();

    // First poll one full interval after start
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let outcome = loop {
        tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => break None,
            _ = ticker.tick() => {}
        }

        let started = Instant::now();
        let result = tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => {
                tracing::debug!(transaction_id = %transaction_id, "Discarding in-flight status request");
                break None;
            }
            result = provider.fetch_status(&transaction_id) => result,
        };

        if let Some(metrics) = &metrics {
            metrics.record_fetch(result.is_ok(), started.elapsed().as_secs_f64());
        }

        match record_tick(&state, result) {
            Tick::Continue => {}
            Tick::Stopped => break None,
            Tick::Finished(outcome) => break Some(outcome),
        }
    };

    if let Some(outcome) = outcome {
        outcome.emit(events.as_ref());
    }

    if let Some(metrics) = &metrics {
        metrics.watch_finished(outcome.as_ref().map(PollOutcome::label).unwrap_or("cancelled"));
    }
}

enum Tick {
    Continue,
    Stopped,
    Finished(PollOutcome),
}

/// Apply one fetch result to the state. The terminal decision is made under
/// the same lock `stop` takes, so only one of them can win.
fn record_tick(
    state: &Mutex<PollState>,
    result: Result<StatusCode, StatusFetchError>,
) -> Tick {
    let mut state = lock_state(state);
    if state.terminal {
        return Tick::Stopped;
    }

    state.attempt_count += 1;

    let status = match result {
        Ok(code) => {
            state.last_status = Some(code);
            let status = DepositStatus::classify(code);
            tracing::debug!(
                transaction_id = %state.transaction_id,
                attempt = state.attempt_count,
                status = %status,
                "Deposit status polled"
            );
            Some(status)
        }
        Err(e) => {
            tracing::warn!(
                transaction_id = %state.transaction_id,
                attempt = state.attempt_count,
                error = %e,
                "Deposit status request failed"
            );
            None
        }
    };

    let outcome = match status {
        Some(DepositStatus::Confirmed) => PollOutcome::Confirmed,
        Some(failed @ DepositStatus::Failed(code)) => PollOutcome::Failed {
            code,
            variant: failed.failure_variant(),
        },
        _ if state.budget_exhausted() => PollOutcome::Expired,
        _ => return Tick::Continue,
    };

    state.terminal = true;
    tracing::info!(
        transaction_id = %state.transaction_id,
        attempts = state.attempt_count,
        outcome = outcome.label(),
        "Deposit polling finished"
    );

    Tick::Finished(outcome)
}
