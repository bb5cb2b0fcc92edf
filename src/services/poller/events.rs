use std::sync::Mutex;

use super::status::StatusCode;

/// Receiver of poller outcomes.
///
/// At most one of `on_confirmed`, `on_failed` and `on_expired` is called per
/// poller. `on_failed_variant` is only ever called right before `on_failed`.
pub trait DepositEventSink: Send + Sync {
    fn on_confirmed(&self);
    fn on_failed(&self, code: StatusCode);
    fn on_failed_variant(&self, variant: StatusCode);
    fn on_expired(&self);
}

/// Event as seen by a `RecordingSink`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositEvent {
    Confirmed,
    Failed(StatusCode),
    FailedVariant(StatusCode),
    Expired,
}

/// Sink that keeps every event in order. Handy for callers that want to
/// inspect outcomes after the fact.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DepositEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DepositEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push(&self, event: DepositEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl DepositEventSink for RecordingSink {
    fn on_confirmed(&self) {
        self.push(DepositEvent::Confirmed);
    }

    fn on_failed(&self, code: StatusCode) {
        self.push(DepositEvent::Failed(code));
    }

    fn on_failed_variant(&self, variant: StatusCode) {
        self.push(DepositEvent::FailedVariant(variant));
    }

    fn on_expired(&self) {
        self.push(DepositEvent::Expired);
    }
}
