use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    entities::{
        line, product_code, product_code_line,
        work_order::{self, WorkOrderStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Product definitions and production work orders.
#[derive(Clone)]
pub struct WorkOrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductCode {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductCode {
    #[validate(length(min = 1, max = 50))]
    pub code: Option<String>,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    pub disabled: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateWorkOrder {
    #[validate(length(min = 1, max = 50))]
    pub order_number: String,
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    pub line_id: i32,
    pub planned_start: DateTime<Utc>,
    pub planned_end: DateTime<Utc>,
    #[validate(range(min = 1))]
    pub target_quantity: i32,
    pub status: WorkOrderStatus,
    pub product_code_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateWorkOrder {
    #[validate(length(min = 1, max = 50))]
    pub order_number: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub description: Option<String>,
    pub line_id: Option<i32>,
    pub planned_start: Option<DateTime<Utc>>,
    pub planned_end: Option<DateTime<Utc>>,
    #[validate(range(min = 1))]
    pub target_quantity: Option<i32>,
    pub status: Option<WorkOrderStatus>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    #[validate(range(min = 0))]
    pub actual_quantity: Option<i32>,
    pub product_code_id: Option<i32>,
}

impl WorkOrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    // Product codes

    #[instrument(skip(self))]
    pub async fn create_product_code(
        &self,
        input: CreateProductCode,
    ) -> Result<product_code::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let existing = product_code::Entity::find()
            .filter(product_code::Column::Code.eq(input.code.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Product code '{}' already exists",
                input.code
            )));
        }

        let created = product_code::ActiveModel {
            code: Set(input.code.clone()),
            description: Set(input.description),
            disabled: Set(input.disabled),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| {
            ServiceError::write_error(e, format!("Product code '{}' already exists", input.code))
        })?;

        self.emit(Event::ProductCodeCreated(created.id)).await;
        Ok(created)
    }

    pub async fn list_product_codes(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<product_code::Model>, u64), ServiceError> {
        let db = &*self.db;
        let total = product_code::Entity::find().count(db).await?;
        let items = product_code::Entity::find()
            .order_by_asc(product_code::Column::Id)
            .offset(page.saturating_sub(1) * per_page)
            .limit(per_page)
            .all(db)
            .await?;
        Ok((items, total))
    }

    pub async fn get_product_code(&self, id: i32) -> Result<product_code::Model, ServiceError> {
        product_code::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product code {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn update_product_code(
        &self,
        id: i32,
        input: UpdateProductCode,
    ) -> Result<product_code::Model, ServiceError> {
        input.validate()?;
        let model = self.get_product_code(id).await?;

        let mut active = model.clone().into_active_model();
        if let Some(code) = input.code {
            active.code = Set(code);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(disabled) = input.disabled {
            active.disabled = Set(disabled);
        }
        if !active.is_changed() {
            return Ok(model);
        }
        let updated = active
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::write_error(e, "Product code already in use"))?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_product_code(&self, id: i32) -> Result<(), ServiceError> {
        let model = self.get_product_code(id).await?;
        model.delete(&*self.db).await.map_err(|e| {
            ServiceError::delete_error(e, format!("Product code {id} is still referenced"))
        })?;
        info!(id, "product code deleted");
        Ok(())
    }

    /// Associate a product code with a line able to produce it.
    #[instrument(skip(self))]
    pub async fn assign_product_to_line(
        &self,
        product_code_id: i32,
        line_id: i32,
    ) -> Result<product_code_line::Model, ServiceError> {
        let db = &*self.db;
        self.get_product_code(product_code_id).await?;
        let line = line::Entity::find_by_id(line_id).one(db).await?;
        if line.is_none() {
            return Err(ServiceError::NotFound(format!("Line {line_id} not found")));
        }

        let existing = product_code_line::Entity::find()
            .filter(product_code_line::Column::ProductCodeId.eq(product_code_id))
            .filter(product_code_line::Column::LineId.eq(line_id))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Product code {product_code_id} is already assigned to line {line_id}"
            )));
        }

        let created = product_code_line::ActiveModel {
            product_code_id: Set(product_code_id),
            line_id: Set(line_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| {
            ServiceError::write_error(
                e,
                format!("Product code {product_code_id} is already assigned to line {line_id}"),
            )
        })?;
        Ok(created)
    }

    pub async fn list_product_lines(
        &self,
        product_code_id: i32,
    ) -> Result<Vec<product_code_line::Model>, ServiceError> {
        let items = product_code_line::Entity::find()
            .filter(product_code_line::Column::ProductCodeId.eq(product_code_id))
            .all(&*self.db)
            .await?;
        Ok(items)
    }

    #[instrument(skip(self))]
    pub async fn unassign_product_from_line(
        &self,
        product_code_id: i32,
        line_id: i32,
    ) -> Result<(), ServiceError> {
        let db = &*self.db;
        let assignment = product_code_line::Entity::find()
            .filter(product_code_line::Column::ProductCodeId.eq(product_code_id))
            .filter(product_code_line::Column::LineId.eq(line_id))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Product code {product_code_id} is not assigned to line {line_id}"
                ))
            })?;
        assignment.delete(db).await?;
        Ok(())
    }

    // Work orders

    #[instrument(skip(self))]
    pub async fn create_work_order(
        &self,
        input: CreateWorkOrder,
    ) -> Result<work_order::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        if input.planned_end < input.planned_start {
            return Err(ServiceError::InvalidInput(format!(
                "Planned end ({}) cannot be before planned start ({})",
                input.planned_end, input.planned_start
            )));
        }

        let line = line::Entity::find_by_id(input.line_id).one(db).await?;
        if line.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Line {} not found",
                input.line_id
            )));
        }

        if let Some(product_code_id) = input.product_code_id {
            self.get_product_code(product_code_id).await?;
        }

        let duplicate = work_order::Entity::find()
            .filter(work_order::Column::OrderNumber.eq(input.order_number.clone()))
            .one(db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Work order '{}' already exists",
                input.order_number
            )));
        }

        let created = work_order::ActiveModel {
            order_number: Set(input.order_number.clone()),
            description: Set(input.description),
            line_id: Set(input.line_id),
            planned_start: Set(input.planned_start),
            planned_end: Set(input.planned_end),
            target_quantity: Set(input.target_quantity),
            status: Set(input.status),
            product_code_id: Set(input.product_code_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| {
            ServiceError::write_error(
                e,
                format!("Work order '{}' already exists", input.order_number),
            )
        })?;

        self.emit(Event::WorkOrderCreated(created.id)).await;
        info!(
            id = created.id,
            order_number = %created.order_number,
            status = %created.status,
            "work order created"
        );
        Ok(created)
    }

    pub async fn list_work_orders(
        &self,
        status: Option<WorkOrderStatus>,
        line_id: Option<i32>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<work_order::Model>, u64), ServiceError> {
        let db = &*self.db;
        let mut condition = sea_orm::Condition::all();
        if let Some(status) = status {
            condition = condition.add(work_order::Column::Status.eq(status));
        }
        if let Some(line_id) = line_id {
            condition = condition.add(work_order::Column::LineId.eq(line_id));
        }

        let total = work_order::Entity::find()
            .filter(condition.clone())
            .count(db)
            .await?;
        let items = work_order::Entity::find()
            .filter(condition)
            .order_by_desc(work_order::Column::CreatedAt)
            .offset(page.saturating_sub(1) * per_page)
            .limit(per_page)
            .all(db)
            .await?;
        Ok((items, total))
    }

    pub async fn get_work_order(&self, id: i32) -> Result<work_order::Model, ServiceError> {
        work_order::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Work order {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn update_work_order(
        &self,
        id: i32,
        input: UpdateWorkOrder,
    ) -> Result<work_order::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;
        let model = self.get_work_order(id).await?;

        if let Some(line_id) = input.line_id {
            let line = line::Entity::find_by_id(line_id).one(db).await?;
            if line.is_none() {
                return Err(ServiceError::NotFound(format!("Line {line_id} not found")));
            }
        }
        if let Some(product_code_id) = input.product_code_id {
            self.get_product_code(product_code_id).await?;
        }

        let mut active = model.clone().into_active_model();
        if let Some(order_number) = input.order_number {
            active.order_number = Set(order_number);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(line_id) = input.line_id {
            active.line_id = Set(line_id);
        }
        if let Some(planned_start) = input.planned_start {
            active.planned_start = Set(planned_start);
        }
        if let Some(planned_end) = input.planned_end {
            active.planned_end = Set(planned_end);
        }
        if let Some(target_quantity) = input.target_quantity {
            active.target_quantity = Set(target_quantity);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(actual_start) = input.actual_start {
            active.actual_start = Set(Some(actual_start));
        }
        if let Some(actual_end) = input.actual_end {
            active.actual_end = Set(Some(actual_end));
        }
        if let Some(actual_quantity) = input.actual_quantity {
            active.actual_quantity = Set(Some(actual_quantity));
        }
        if let Some(product_code_id) = input.product_code_id {
            active.product_code_id = Set(Some(product_code_id));
        }

        if !active.is_changed() {
            return Ok(model);
        }
        let updated = active
            .update(db)
            .await
            .map_err(|e| ServiceError::write_error(e, "Work order number already in use"))?;

        self.emit(Event::WorkOrderUpdated(updated.id)).await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_work_order(&self, id: i32) -> Result<(), ServiceError> {
        let model = self.get_work_order(id).await?;
        model.delete(&*self.db).await.map_err(|e| {
            ServiceError::delete_error(e, format!("Work order {id} is still referenced"))
        })?;
        info!(id, "work order deleted");
        Ok(())
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(event).await;
        }
    }
}
