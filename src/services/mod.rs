pub mod metrics;
pub mod poller;
pub mod rate_limit;
pub mod status_provider;
