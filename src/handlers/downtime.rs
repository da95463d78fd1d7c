use super::common::{
    created_response, map_service_error, no_content_response, success_response, PaginatedResponse,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::downtime::{CreateStateHistory, CreateStateReason, UpdateStateReason},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct StateHistoryFilters {
    pub run_id: Option<i32>,
    pub line_id: Option<i32>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    50
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/state-reasons",
            get(list_state_reasons).post(create_state_reason),
        )
        .route(
            "/state-reasons/:id",
            get(get_state_reason)
                .put(update_state_reason)
                .delete(delete_state_reason),
        )
        .route("/state-reasons/:id/children", get(list_sub_reasons))
        .route("/state-reasons/:id/path", get(resolve_reason_path))
        // State history is append-only: no update or delete routes exist.
        .route(
            "/state-history",
            get(list_state_histories).post(record_state),
        )
}

// State reasons

async fn create_state_reason(
    State(state): State<AppState>,
    Json(payload): Json<CreateStateReason>,
) -> Result<impl IntoResponse, ApiError> {
    let reason = state
        .services
        .downtime
        .create_state_reason(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(reason))
}

async fn list_state_reasons(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .services
        .downtime
        .list_state_reasons()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(items))
}

async fn get_state_reason(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let reason = state
        .services
        .downtime
        .get_state_reason(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(reason))
}

async fn update_state_reason(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStateReason>,
) -> Result<impl IntoResponse, ApiError> {
    let reason = state
        .services
        .downtime
        .update_state_reason(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(reason))
}

async fn delete_state_reason(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .downtime
        .delete_state_reason(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

/// Direct sub-reasons of a reason, unordered.
async fn list_sub_reasons(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let children = state
        .services
        .downtime
        .list_sub_reasons(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(children))
}

/// Chain of reasons from the root down to the requested one.
async fn resolve_reason_path(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let chain = state
        .services
        .downtime
        .resolve_path(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(chain))
}

// State history

/// Record a downtime interval; a run-scoped interval recomputes the run's
/// metrics.
async fn record_state(
    State(state): State<AppState>,
    Json(payload): Json<CreateStateHistory>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .services
        .downtime
        .record_state(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(record))
}

async fn list_state_histories(
    State(state): State<AppState>,
    Query(filters): Query<StateHistoryFilters>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .downtime
        .list_state_histories(filters.run_id, filters.line_id, filters.page, filters.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        items,
        filters.page,
        filters.per_page,
        total,
    )))
}
