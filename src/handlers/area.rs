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
        .route("/", get(list_areas).post(create_area))
        .route("/:id", get(get_area).put(update_area).delete(delete_area))
}

/// Create an area. `parent_id` is the owning site.
async fn create_area(
    State(state): State<AppState>,
    Json(payload): Json<CreateNode>,
) -> Result<impl IntoResponse, ApiError> {
    let area = state
        .services
        .hierarchy
        .create_area(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(area))
}

async fn list_areas(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .hierarchy
        .list_areas(pagination.page, pagination.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        items,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

async fn get_area(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let area = state
        .services
        .hierarchy
        .get_area(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(area))
}

async fn update_area(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateNode>,
) -> Result<impl IntoResponse, ApiError> {
    let area = state
        .services
        .hierarchy
        .update_area(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(area))
}

async fn delete_area(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .hierarchy
        .delete_area(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
