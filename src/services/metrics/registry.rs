use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Central metrics registry for the deposit poller service
pub struct MetricsRegistry {
    registry: Registry,

    // HTTP Metrics
    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,

    // Status request Metrics
    pub poll_requests_total: CounterVec,
    pub poll_request_duration_seconds: HistogramVec,

    // Watch Metrics
    pub watch_outcomes_total: CounterVec,
    pub watches_active: Gauge,
}

impl MetricsRegistry {
    pub fn new() -> Result<Arc<Self>, Box<dyn std::error::Error>> {
        let registry = Registry::new();

        // HTTP Metrics
        let http_requests_total = CounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests").namespace("deposit"),
            &["method", "endpoint", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request duration")
                .namespace("deposit")
                .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
            &["method", "endpoint"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        // Status request Metrics
        let poll_requests_total = CounterVec::new(
            Opts::new("poll_requests_total", "Status requests sent to the provider")
                .namespace("deposit"),
            &["result"],
        )?;
        registry.register(Box::new(poll_requests_total.clone()))?;

        let poll_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new("poll_request_duration_seconds", "Status request duration")
                .namespace("deposit")
                .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["result"],
        )?;
        registry.register(Box::new(poll_request_duration_seconds.clone()))?;

        // Watch Metrics
        let watch_outcomes_total = CounterVec::new(
            Opts::new("watch_outcomes_total", "Finished deposit watches by outcome")
                .namespace("deposit"),
            &["outcome"],
        )?;
        registry.register(Box::new(watch_outcomes_total.clone()))?;

        let watches_active = Gauge::with_opts(
            Opts::new("watches_active", "Deposit watches currently polling").namespace("deposit"),
        )?;
        registry.register(Box::new(watches_active.clone()))?;

        Ok(Arc::new(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            poll_requests_total,
            poll_request_duration_seconds,
            watch_outcomes_total,
            watches_active,
        }))
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> Result<String, Box<dyn std::error::Error>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
