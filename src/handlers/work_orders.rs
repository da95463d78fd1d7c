use super::common::{
    created_response, map_service_error, no_content_response, success_response, PaginatedResponse,
};
use crate::{
    auth::AuthUser,
    entities::work_order::WorkOrderStatus,
    errors::ApiError,
    handlers::AppState,
    services::work_orders::{
        CreateProductCode, CreateWorkOrder, UpdateProductCode, UpdateWorkOrder,
    },
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct WorkOrderFilters {
    pub status: Option<WorkOrderStatus>,
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
    20
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_work_orders).post(create_work_order))
        .route(
            "/:id",
            get(get_work_order)
                .put(update_work_order)
                .delete(delete_work_order),
        )
}

pub fn product_code_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_product_codes).post(create_product_code))
        .route(
            "/:id",
            get(get_product_code)
                .put(update_product_code)
                .delete(delete_product_code),
        )
        .route(
            "/:id/lines",
            get(list_product_lines).post(assign_product_line),
        )
        .route("/:id/lines/:line_id", axum::routing::delete(unassign_product_line))
}

/// Create a work order against a line.
#[utoipa::path(
    post,
    path = "/api/v1/work-orders",
    request_body = CreateWorkOrder,
    responses(
        (status = 201, description = "Work order created"),
        (status = 404, description = "Line not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order number already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn create_work_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateWorkOrder>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .work_orders
        .create_work_order(payload)
        .await
        .map_err(map_service_error)?;
    info!(user = %user.user_id, order_number = %order.order_number, "work order created");
    Ok(created_response(order))
}

#[utoipa::path(
    get,
    path = "/api/v1/work-orders",
    params(WorkOrderFilters),
    responses(
        (status = 200, description = "List work orders"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn list_work_orders(
    State(state): State<AppState>,
    Query(filters): Query<WorkOrderFilters>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .work_orders
        .list_work_orders(filters.status, filters.line_id, filters.page, filters.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        items,
        filters.page,
        filters.per_page,
        total,
    )))
}

pub async fn get_work_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .work_orders
        .get_work_order(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

pub async fn update_work_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateWorkOrder>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .work_orders
        .update_work_order(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

pub async fn delete_work_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .work_orders
        .delete_work_order(id)
        .await
        .map_err(map_service_error)?;
    info!(user = %user.user_id, id, "work order deleted");
    Ok(no_content_response())
}

// Product codes

async fn create_product_code(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductCode>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .work_orders
        .create_product_code(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(product))
}

async fn list_product_codes(
    State(state): State<AppState>,
    Query(pagination): Query<super::common::PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .work_orders
        .list_product_codes(pagination.page, pagination.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        items,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

async fn get_product_code(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .work_orders
        .get_product_code(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(product))
}

async fn update_product_code(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProductCode>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .work_orders
        .update_product_code(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(product))
}

async fn delete_product_code(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .work_orders
        .delete_product_code(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

#[derive(Debug, Deserialize)]
struct AssignLineRequest {
    line_id: i32,
}

async fn assign_product_line(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<AssignLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let assignment = state
        .services
        .work_orders
        .assign_product_to_line(id, payload.line_id)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(assignment))
}

async fn list_product_lines(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let assignments = state
        .services
        .work_orders
        .list_product_lines(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(assignments))
}

async fn unassign_product_line(
    State(state): State<AppState>,
    Path((id, line_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .work_orders
        .unassign_product_from_line(id, line_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
