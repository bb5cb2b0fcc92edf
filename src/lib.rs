pub mod config;
pub mod modules;
pub mod services;

use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use modules::deposit::{deposit_routes, WatchStore};
use modules::metrics::metrics_routes;
use services::metrics::{metrics_middleware, MetricsRegistry, PollMetricsCollector};
use services::poller::PollerConfig;
use services::rate_limit::create_watch_rate_limiter;
use services::status_provider::StatusProvider;

pub struct AppState {
    pub watches: WatchStore,
    pub metrics: Arc<MetricsRegistry>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn StatusProvider>,
        defaults: PollerConfig,
        retention: chrono::Duration,
    ) -> Result<Arc<Self>, Box<dyn std::error::Error>> {
        let metrics = MetricsRegistry::new()?;
        let watches = WatchStore::new(provider, defaults)
            .with_retention(retention)
            .with_metrics(PollMetricsCollector::new(metrics.clone()));

        Ok(Arc::new(Self { watches, metrics }))
    }
}

pub fn create_app(state: Arc<AppState>, rate_limit_burst: u32) -> Router {
    let limiter = create_watch_rate_limiter(rate_limit_burst);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/deposits", deposit_routes(limiter))
        .merge(metrics_routes())
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            metrics_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(1024 * 16)) // 16KB max body
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Deposit Status Poller API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
