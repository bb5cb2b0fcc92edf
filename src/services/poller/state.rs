use serde::Serialize;

use super::status::StatusCode;

/// Ephemeral state owned by one poller for its lifetime
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollState {
    pub transaction_id: String,
    pub attempt_count: u32,
    pub max_attempts: u32,
    pub last_status: Option<StatusCode>,
    pub terminal: bool,
}

impl PollState {
    pub fn new(transaction_id: String, max_attempts: u32) -> Self {
        Self {
            transaction_id,
            attempt_count: 0,
            max_attempts,
            last_status: None,
            terminal: false,
        }
    }

    pub fn budget_exhausted(&self) -> bool {
        self.attempt_count >= self.max_attempts
    }

    pub fn remaining_attempts(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempt_count)
    }
}
