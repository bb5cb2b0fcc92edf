use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::poller::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    Pending,
    Confirmed,
    Failed,
    Expired,
    Cancelled,
}

impl WatchStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Service-side record of one deposit watch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositWatch {
    pub id: Uuid,
    pub transaction_id: String,
    pub status: WatchStatus,
    pub attempts: u32,
    pub max_attempts: u32,
    pub remaining_attempts: u32,
    pub poll_interval_ms: i64,
    pub last_status_code: Option<StatusCode>,
    pub failure_code: Option<StatusCode>,
    pub failure_variant: Option<StatusCode>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl DepositWatch {
    pub fn new(transaction_id: String, max_attempts: u32, poll_interval_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            status: WatchStatus::Pending,
            attempts: 0,
            max_attempts,
            remaining_attempts: max_attempts,
            poll_interval_ms,
            last_status_code: None,
            failure_code: None,
            failure_variant: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Move to a final status. Records that are no longer pending are left
    /// untouched.
    pub fn finish(&mut self, status: WatchStatus) -> bool {
        if !self.status.is_pending() {
            return false;
        }
        self.status = status;
        self.finished_at = Some(Utc::now());
        true
    }

    /// True once the record has been finished for at least `retention`
    pub fn is_expired_record(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        match self.finished_at {
            Some(finished_at) => now - finished_at >= retention,
            None => false,
        }
    }
}
