use std::sync::Arc;

use super::MetricsRegistry;

/// Collector for deposit poller metrics
#[derive(Clone)]
pub struct PollMetricsCollector {
    metrics: Arc<MetricsRegistry>,
}

impl PollMetricsCollector {
    pub fn new(metrics: Arc<MetricsRegistry>) -> Self {
        Self { metrics }
    }

    pub fn record_fetch(&self, ok: bool, duration_secs: f64) {
        let result = if ok { "ok" } else { "error" };

        self.metrics
            .poll_requests_total
            .with_label_values(&[result])
            .inc();

        self.metrics
            .poll_request_duration_seconds
            .with_label_values(&[result])
            .observe(duration_secs);
    }

    pub fn watch_started(&self) {
        self.metrics.watches_active.inc();
    }

    /// `outcome` is one of confirmed, failed, expired, cancelled
    pub fn watch_finished(&self, outcome: &str) {
        self.metrics.watches_active.dec();
        self.metrics
            .watch_outcomes_total
            .with_label_values(&[outcome])
            .inc();
    }
}
