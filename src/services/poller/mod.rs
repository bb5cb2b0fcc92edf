pub mod config;
pub mod engine;
pub mod events;
pub mod state;
pub mod status;

pub use config::PollerConfig;
pub use engine::{DepositStatusPoller, PollOutcome};
pub use events::{DepositEvent, DepositEventSink, RecordingSink};
pub use state::PollState;
pub use status::{DepositStatus, StatusCode};

#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Polling already started for transaction {0}")]
    AlreadyStarted(String),
}
