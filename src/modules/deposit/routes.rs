use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::services::rate_limit::{RateLimitLayer, WatchRateLimiter};
use crate::AppState;

/// Only watch creation is rate limited
pub fn deposit_routes(limiter: WatchRateLimiter) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(controller::list_watches))
        .route(
            "/",
            post(controller::start_watch).layer(RateLimitLayer::new(limiter)),
        )
        .route(
            "/{id}",
            get(controller::get_watch).delete(controller::stop_watch),
        )
}
