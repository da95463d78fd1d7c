use super::common::{
    created_response, map_service_error, no_content_response, success_response, PaginatedResponse,
    PaginationParams,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::hierarchy::{CreateNode, UpdateNode},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cells).post(create_cell))
        .route("/:id", get(get_cell).put(update_cell).delete(delete_cell))
}

/// Create a work cell. `parent_id` is the owning line.
async fn create_cell(
    State(state): State<AppState>,
    Json(payload): Json<CreateNode>,
) -> Result<impl IntoResponse, ApiError> {
    let cell = state
        .services
        .hierarchy
        .create_cell(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(cell))
}

async fn list_cells(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .hierarchy
        .list_cells(pagination.page, pagination.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        items,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

async fn get_cell(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let cell = state
        .services
        .hierarchy
        .get_cell(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(cell))
}

async fn update_cell(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateNode>,
) -> Result<impl IntoResponse, ApiError> {
    let cell = state
        .services
        .hierarchy
        .update_cell(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(cell))
}

async fn delete_cell(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .hierarchy
        .delete_cell(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
