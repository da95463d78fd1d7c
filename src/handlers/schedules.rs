use super::common::{
    created_response, map_service_error, no_content_response, success_response, PaginatedResponse,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::scheduling::{CreateRun, CreateSchedule, UpdateRun, UpdateSchedule},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ScheduleFilters {
    pub line_id: Option<i32>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

#[derive(Debug, Deserialize)]
pub struct RunFilters {
    pub schedule_id: Option<i32>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

pub fn schedule_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_schedules).post(create_schedule))
        .route(
            "/:id",
            get(get_schedule).put(update_schedule).delete(delete_schedule),
        )
}

pub fn run_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_runs).post(create_run))
        .route("/:id", get(get_run).put(update_run).delete(delete_run))
        .route("/:id/metrics", get(get_run_metrics))
}

// Schedules

async fn create_schedule(
    State(state): State<AppState>,
    Json(payload): Json<CreateSchedule>,
) -> Result<impl IntoResponse, ApiError> {
    let schedule = state
        .services
        .scheduling
        .create_schedule(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(schedule))
}

async fn list_schedules(
    State(state): State<AppState>,
    Query(filters): Query<ScheduleFilters>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .scheduling
        .list_schedules(filters.line_id, filters.page, filters.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        items,
        filters.page,
        filters.per_page,
        total,
    )))
}

async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let schedule = state
        .services
        .scheduling
        .get_schedule(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(schedule))
}

async fn update_schedule(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateSchedule>,
) -> Result<impl IntoResponse, ApiError> {
    let schedule = state
        .services
        .scheduling
        .update_schedule(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(schedule))
}

async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .scheduling
        .delete_schedule(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

// Runs

async fn create_run(
    State(state): State<AppState>,
    Json(payload): Json<CreateRun>,
) -> Result<impl IntoResponse, ApiError> {
    let run = state
        .services
        .scheduling
        .create_run(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(run))
}

async fn list_runs(
    State(state): State<AppState>,
    Query(filters): Query<RunFilters>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .scheduling
        .list_runs(filters.schedule_id, filters.page, filters.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        items,
        filters.page,
        filters.per_page,
        total,
    )))
}

async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let run = state
        .services
        .scheduling
        .get_run(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(run))
}

async fn update_run(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateRun>,
) -> Result<impl IntoResponse, ApiError> {
    let run = state
        .services
        .scheduling
        .update_run(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(run))
}

async fn delete_run(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .scheduling
        .delete_run(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

/// Derived OEE record for a run; 404 until the first count or downtime
/// record for the run arrives.
async fn get_run_metrics(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    // Surface a clear 404 for a missing run before looking for metrics.
    state
        .services
        .scheduling
        .get_run(id)
        .await
        .map_err(map_service_error)?;

    let metrics = state
        .services
        .metrics
        .get_for_run(id)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| ApiError::NotFound(format!("No metrics recorded for run {id}")))?;
    Ok(success_response(metrics))
}
