use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::crud::WatchError;
use super::model::DepositWatch;
use super::schema::{ErrorResponse, StartWatchRequest};
use crate::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn watch_error(e: WatchError) -> ApiError {
    let status = match &e {
        WatchError::NotFound(_) => StatusCode::NOT_FOUND,
        WatchError::AlreadyWatching(_) => StatusCode::CONFLICT,
        WatchError::Poller(_) => StatusCode::BAD_REQUEST,
    };
    (status, Json(ErrorResponse::new(e.to_string())))
}

// =============================================================================
// POST /deposits - Start watching a pending deposit
// =============================================================================

pub async fn start_watch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartWatchRequest>,
) -> Result<(StatusCode, Json<DepositWatch>), ApiError> {
    if let Err(e) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        ));
    }

    let config = req.poller_config(state.watches.defaults());
    let watch = state
        .watches
        .start_watch(req.transaction_id, config)
        .await
        .map_err(watch_error)?;

    Ok((StatusCode::CREATED, Json(watch)))
}

// =============================================================================
// GET /deposits - List watches
// =============================================================================

pub async fn list_watches(State(state): State<Arc<AppState>>) -> Json<Vec<DepositWatch>> {
    Json(state.watches.list().await)
}

// =============================================================================
// GET /deposits/{id} - Watch status
// =============================================================================

pub async fn get_watch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DepositWatch>, ApiError> {
    state
        .watches
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| watch_error(WatchError::NotFound(id)))
}

// =============================================================================
// DELETE /deposits/{id} - Cancel a watch (dialog dismissed)
// =============================================================================

pub async fn stop_watch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DepositWatch>, ApiError> {
    state
        .watches
        .stop_watch(id)
        .await
        .map(Json)
        .map_err(watch_error)
}
