use super::common::{
    created_response, map_service_error, no_content_response, success_response, PaginatedResponse,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::oee::{
        CreateCountHistory, CreateCountTag, CreateCountType, UpdateCountTag, UpdateCountType,
    },
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct CountHistoryFilters {
    pub run_id: Option<i32>,
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
        .route("/count-types", get(list_count_types).post(create_count_type))
        .route(
            "/count-types/:id",
            get(get_count_type)
                .put(update_count_type)
                .delete(delete_count_type),
        )
        .route("/count-tags", get(list_count_tags).post(create_count_tag))
        .route(
            "/count-tags/:id",
            get(get_count_tag)
                .put(update_count_tag)
                .delete(delete_count_tag),
        )
        // Count history is append-only: no update or delete routes exist.
        .route(
            "/count-history",
            get(list_count_histories).post(record_count),
        )
}

// Count types

async fn create_count_type(
    State(state): State<AppState>,
    Json(payload): Json<CreateCountType>,
) -> Result<impl IntoResponse, ApiError> {
    let count_type = state
        .services
        .oee
        .create_count_type(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(count_type))
}

async fn list_count_types(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .services
        .oee
        .list_count_types()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(items))
}

async fn get_count_type(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let count_type = state
        .services
        .oee
        .get_count_type(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(count_type))
}

async fn update_count_type(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCountType>,
) -> Result<impl IntoResponse, ApiError> {
    let count_type = state
        .services
        .oee
        .update_count_type(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(count_type))
}

async fn delete_count_type(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .oee
        .delete_count_type(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

// Count tags

async fn create_count_tag(
    State(state): State<AppState>,
    Json(payload): Json<CreateCountTag>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state
        .services
        .oee
        .create_count_tag(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(tag))
}

async fn list_count_tags(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .services
        .oee
        .list_count_tags()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(items))
}

async fn get_count_tag(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state
        .services
        .oee
        .get_count_tag(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(tag))
}

async fn update_count_tag(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCountTag>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state
        .services
        .oee
        .update_count_tag(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(tag))
}

async fn delete_count_tag(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .oee
        .delete_count_tag(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

// Count history

/// Record a count event; a run-scoped count recomputes the run's metrics.
#[utoipa::path(
    post,
    path = "/api/v1/oee/count-history",
    request_body = CreateCountHistory,
    responses(
        (status = 201, description = "Count recorded"),
        (status = 400, description = "Tag and count type disagree", body = crate::errors::ErrorResponse),
        (status = 404, description = "Tag, type or run not found", body = crate::errors::ErrorResponse)
    ),
    tag = "oee"
)]
pub async fn record_count(
    State(state): State<AppState>,
    Json(payload): Json<CreateCountHistory>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .services
        .oee
        .record_count(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(record))
}

#[utoipa::path(
    get,
    path = "/api/v1/oee/count-history",
    params(CountHistoryFilters),
    responses(
        (status = 200, description = "List count history"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "oee"
)]
pub async fn list_count_histories(
    State(state): State<AppState>,
    Query(filters): Query<CountHistoryFilters>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .oee
        .list_count_histories(filters.run_id, filters.page, filters.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        items,
        filters.page,
        filters.per_page,
        total,
    )))
}
