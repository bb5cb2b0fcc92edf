use serde::{Deserialize, Serialize};

/// Raw status code reported by the remote payment system.
pub type StatusCode = i64;

pub const CONFIRMED_CODE: StatusCode = 2;
pub const FAILED_CODES: [StatusCode; 6] = [1, 3, 6, 7, 8, 9];

/// Codes 7 and 8 are reported to the UI as failure variant 3.
const VARIANT_CODES: [StatusCode; 2] = [7, 8];
pub const FAILED_VARIANT: StatusCode = 3;

/// Classification of a single status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "code")]
pub enum DepositStatus {
    Confirmed,
    Failed(StatusCode),
    Pending(StatusCode),
}

impl DepositStatus {
    pub fn classify(code: StatusCode) -> Self {
        if code == CONFIRMED_CODE {
            Self::Confirmed
        } else if FAILED_CODES.contains(&code) {
            Self::Failed(code)
        } else {
            Self::Pending(code)
        }
    }

    /// Secondary failure variant announced before `on_failed`, if any
    pub fn failure_variant(&self) -> Option<StatusCode> {
        match self {
            Self::Failed(code) if VARIANT_CODES.contains(code) => Some(FAILED_VARIANT),
            _ => None,
        }
    }
}

impl std::fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confirmed => write!(f, "confirmed"),
            Self::Failed(code) => write!(f, "failed({})", code),
            Self::Pending(code) => write!(f, "pending({})", code),
        }
    }
}
