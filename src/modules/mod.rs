pub mod deposit;
pub mod metrics;
