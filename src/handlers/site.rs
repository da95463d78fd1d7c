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
        .route("/", get(list_sites).post(create_site))
        .route("/:id", get(get_site).put(update_site).delete(delete_site))
}

/// Create a site. `parent_id` is the owning enterprise.
async fn create_site(
    State(state): State<AppState>,
    Json(payload): Json<CreateNode>,
) -> Result<impl IntoResponse, ApiError> {
    let site = state
        .services
        .hierarchy
        .create_site(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(site))
}

async fn list_sites(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .hierarchy
        .list_sites(pagination.page, pagination.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        items,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

async fn get_site(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let site = state
        .services
        .hierarchy
        .get_site(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(site))
}

async fn update_site(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateNode>,
) -> Result<impl IntoResponse, ApiError> {
    let site = state
        .services
        .hierarchy
        .update_site(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(site))
}

async fn delete_site(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .hierarchy
        .delete_site(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
