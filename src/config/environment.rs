use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::modules::deposit::crud::DEFAULT_RETENTION_SECS;
use crate::services::poller::PollerConfig;
use crate::services::poller::config::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_TOTAL_TIMEOUT_SECONDS};

/// Environment configuration
/// Loads and validates environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub status_api_url: String,
    pub status_api_key: Option<String>,
    pub status_request_timeout: Duration,
    pub poller: PollerConfig,
    pub bind_addr: String,
    pub rate_limit_burst: u32,
    pub watch_retention: chrono::Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let status_api_url = env::var("STATUS_API_URL")
            .map_err(|_| "STATUS_API_URL must be set".to_string())?;

        let status_api_key = env::var("STATUS_API_KEY").ok().filter(|key| !key.is_empty());

        let timeout_secs: u64 = parse_var("STATUS_REQUEST_TIMEOUT_SECS", 10)?;

        let poller = PollerConfig::new(
            parse_var("POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?,
            parse_var("TOTAL_TIMEOUT_SECONDS", DEFAULT_TOTAL_TIMEOUT_SECONDS)?,
        );
        poller.validate().map_err(|e| e.to_string())?;

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let rate_limit_burst = parse_var("RATE_LIMIT_BURST", 10)?;

        let retention_secs: i64 = parse_var("WATCH_RETENTION_SECS", DEFAULT_RETENTION_SECS)?;
        if retention_secs < 0 {
            return Err("WATCH_RETENTION_SECS must not be negative".to_string());
        }

        Ok(Self {
            status_api_url,
            status_api_key,
            status_request_timeout: Duration::from_secs(timeout_secs),
            poller,
            bind_addr,
            rate_limit_burst,
            watch_retention: chrono::Duration::seconds(retention_secs),
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("{} must be a number, got {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}
