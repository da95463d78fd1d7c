use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MES API",
        description = "Manufacturing Execution System backend: plant hierarchy, work orders, production runs, OEE and downtime tracking"
    ),
    paths(
        crate::handlers::enterprise::create_enterprise,
        crate::handlers::enterprise::list_enterprises,
        crate::handlers::enterprise::get_enterprise,
        crate::handlers::enterprise::update_enterprise,
        crate::handlers::enterprise::delete_enterprise,
        crate::handlers::work_orders::create_work_order,
        crate::handlers::work_orders::list_work_orders,
        crate::handlers::oee::record_count,
        crate::handlers::oee::list_count_histories,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::services::hierarchy::CreateEnterprise,
        crate::services::hierarchy::UpdateEnterprise,
        crate::services::hierarchy::CreateNode,
        crate::services::hierarchy::UpdateNode,
        crate::services::hierarchy::CreateLine,
        crate::services::hierarchy::UpdateLine,
        crate::services::work_orders::CreateProductCode,
        crate::services::work_orders::UpdateProductCode,
        crate::services::work_orders::CreateWorkOrder,
        crate::services::work_orders::UpdateWorkOrder,
        crate::services::scheduling::CreateSchedule,
        crate::services::scheduling::UpdateSchedule,
        crate::services::scheduling::CreateRun,
        crate::services::scheduling::UpdateRun,
        crate::services::oee::CreateCountType,
        crate::services::oee::UpdateCountType,
        crate::services::oee::CreateCountTag,
        crate::services::oee::UpdateCountTag,
        crate::services::oee::CreateCountHistory,
        crate::services::downtime::CreateStateReason,
        crate::services::downtime::UpdateStateReason,
        crate::services::downtime::CreateStateHistory,
    )),
    tags(
        (name = "hierarchy", description = "ISA-95 plant hierarchy"),
        (name = "work-orders", description = "Production work orders"),
        (name = "oee", description = "Counts and OEE metrics"),
    )
)]
pub struct ApiDoc;

/// Swagger UI served at `/docs`, backed by the generated OpenAPI document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
