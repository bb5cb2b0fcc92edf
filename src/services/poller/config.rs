use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::PollerError;

pub const DEFAULT_POLL_INTERVAL_MS: i64 = 10_000;
pub const DEFAULT_TOTAL_TIMEOUT_SECONDS: i64 = 300;

/// Poll cadence for a single deposit watch.
///
/// Values are signed so that bad input coming from env vars or request
/// bodies is rejected by `validate` instead of failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollerConfig {
    pub poll_interval_ms: i64,
    pub total_timeout_seconds: i64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            total_timeout_seconds: DEFAULT_TOTAL_TIMEOUT_SECONDS,
        }
    }
}

impl PollerConfig {
    pub fn new(poll_interval_ms: i64, total_timeout_seconds: i64) -> Self {
        Self {
            poll_interval_ms,
            total_timeout_seconds,
        }
    }

    /// Check the config and return the attempt budget.
    /// max_attempts = total_timeout_seconds * 1000 / poll_interval_ms
    pub fn validate(&self) -> Result<u32, PollerError> {
        if self.poll_interval_ms <= 0 {
            return Err(PollerError::InvalidConfig(format!(
                "poll_interval_ms must be positive, got {}",
                self.poll_interval_ms
            )));
        }

        if self.total_timeout_seconds <= 0 {
            return Err(PollerError::InvalidConfig(format!(
                "total_timeout_seconds must be positive, got {}",
                self.total_timeout_seconds
            )));
        }

        let total_ms = self.total_timeout_seconds.checked_mul(1000).ok_or_else(|| {
            PollerError::InvalidConfig(format!(
                "total_timeout_seconds too large: {}",
                self.total_timeout_seconds
            ))
        })?;

        let attempts = total_ms / self.poll_interval_ms;
        if attempts == 0 {
            return Err(PollerError::InvalidConfig(format!(
                "poll interval {}ms exceeds total timeout {}s",
                self.poll_interval_ms, self.total_timeout_seconds
            )));
        }

        u32::try_from(attempts).map_err(|_| {
            PollerError::InvalidConfig(format!("attempt budget too large: {}", attempts))
        })
    }

    /// Interval between ticks. Only meaningful after `validate` succeeded.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1) as u64)
    }
}
