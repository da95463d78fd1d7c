use super::common::{
    created_response, map_service_error, no_content_response, success_response, PaginatedResponse,
    PaginationParams,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::hierarchy::{CreateEnterprise, UpdateEnterprise},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_enterprises).post(create_enterprise))
        .route(
            "/:id",
            get(get_enterprise)
                .put(update_enterprise)
                .delete(delete_enterprise),
        )
}

/// Create a new enterprise. Names are globally unique.
#[utoipa::path(
    post,
    path = "/api/v1/enterprises",
    request_body = CreateEnterprise,
    responses(
        (status = 201, description = "Enterprise created"),
        (status = 409, description = "Name already in use", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "hierarchy"
)]
pub async fn create_enterprise(
    State(state): State<AppState>,
    Json(payload): Json<CreateEnterprise>,
) -> Result<impl IntoResponse, ApiError> {
    let enterprise = state
        .services
        .hierarchy
        .create_enterprise(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(enterprise))
}

#[utoipa::path(
    get,
    path = "/api/v1/enterprises",
    params(PaginationParams),
    responses(
        (status = 200, description = "List enterprises"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "hierarchy"
)]
pub async fn list_enterprises(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .hierarchy
        .list_enterprises(pagination.page, pagination.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        items,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/enterprises/{id}",
    responses(
        (status = 200, description = "Enterprise"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "hierarchy"
)]
pub async fn get_enterprise(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let enterprise = state
        .services
        .hierarchy
        .get_enterprise(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(enterprise))
}

#[utoipa::path(
    put,
    path = "/api/v1/enterprises/{id}",
    request_body = UpdateEnterprise,
    responses(
        (status = 200, description = "Enterprise updated"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "hierarchy"
)]
pub async fn update_enterprise(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateEnterprise>,
) -> Result<impl IntoResponse, ApiError> {
    let enterprise = state
        .services
        .hierarchy
        .update_enterprise(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(enterprise))
}

#[utoipa::path(
    delete,
    path = "/api/v1/enterprises/{id}",
    responses(
        (status = 204, description = "Enterprise deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Enterprise still has sites", body = crate::errors::ErrorResponse)
    ),
    tag = "hierarchy"
)]
pub async fn delete_enterprise(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .hierarchy
        .delete_enterprise(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
