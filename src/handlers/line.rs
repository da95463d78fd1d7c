use super::common::{
    created_response, map_service_error, no_content_response, success_response, PaginatedResponse,
    PaginationParams,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::hierarchy::{CreateLine, UpdateLine},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_lines).post(create_line))
        .route("/:id", get(get_line).put(update_line).delete(delete_line))
}

/// Create a production line. `parent_id` is the owning area.
async fn create_line(
    State(state): State<AppState>,
    Json(payload): Json<CreateLine>,
) -> Result<impl IntoResponse, ApiError> {
    let line = state
        .services
        .hierarchy
        .create_line(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(line))
}

async fn list_lines(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .hierarchy
        .list_lines(pagination.page, pagination.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        items,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

async fn get_line(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let line = state
        .services
        .hierarchy
        .get_line(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(line))
}

async fn update_line(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateLine>,
) -> Result<impl IntoResponse, ApiError> {
    let line = state
        .services
        .hierarchy
        .update_line(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(line))
}

async fn delete_line(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .hierarchy
        .delete_line(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
