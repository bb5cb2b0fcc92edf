use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::services::poller::PollerConfig;

// =============================================================================
// POST /deposits
// =============================================================================

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct StartWatchRequest {
    #[validate(
        length(min = 1, max = 128),
        custom(function = "validate_transaction_id")
    )]
    pub transaction_id: String,
    pub poll_interval_ms: Option<i64>,
    pub total_timeout_seconds: Option<i64>,
}

/// "." and ".." cannot be sent as a URL path segment
fn validate_transaction_id(transaction_id: &str) -> Result<(), ValidationError> {
    if transaction_id == "." || transaction_id == ".." {
        return Err(ValidationError::new("dot_segment"));
    }
    Ok(())
}

impl StartWatchRequest {
    /// Request overrides on top of the service defaults. Range checks are
    /// left to the poller so they surface as InvalidConfig.
    pub fn poller_config(&self, defaults: PollerConfig) -> PollerConfig {
        PollerConfig::new(
            self.poll_interval_ms.unwrap_or(defaults.poll_interval_ms),
            self.total_timeout_seconds
                .unwrap_or(defaults.total_timeout_seconds),
        )
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
