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
    entities::{count_history, count_tag, count_type, run},
    errors::ServiceError,
    events::{Event, EventSender},
    services::metrics::MetricsService,
};

/// Count classification, count sources and the append-only count log.
#[derive(Clone)]
pub struct OeeService {
    db: Arc<DatabaseConnection>,
    metrics: Arc<MetricsService>,
    event_sender: Option<EventSender>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCountType {
    #[validate(length(min = 1, max = 100))]
    pub label: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCountType {
    #[validate(length(min = 1, max = 100))]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCountTag {
    #[validate(length(min = 1, max = 255))]
    pub path: String,
    /// Count type this tag reports into.
    pub parent_id: i32,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCountTag {
    #[validate(length(min = 1, max = 255))]
    pub path: Option<String>,
    pub parent_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCountHistory {
    pub timestamp: DateTime<Utc>,
    #[validate(range(min = 1))]
    pub count: i32,
    pub tag_id: i32,
    pub count_type_id: i32,
    pub run_id: Option<i32>,
}

impl OeeService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        metrics: Arc<MetricsService>,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            db,
            metrics,
            event_sender,
        }
    }

    // Count types

    #[instrument(skip(self))]
    pub async fn create_count_type(
        &self,
        input: CreateCountType,
    ) -> Result<count_type::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let existing = count_type::Entity::find()
            .filter(count_type::Column::Label.eq(input.label.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Count type '{}' already exists",
                input.label
            )));
        }

        let created = count_type::ActiveModel {
            label: Set(input.label.clone()),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| {
            ServiceError::write_error(e, format!("Count type '{}' already exists", input.label))
        })?;
        Ok(created)
    }

    pub async fn list_count_types(&self) -> Result<Vec<count_type::Model>, ServiceError> {
        let items = count_type::Entity::find()
            .order_by_asc(count_type::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(items)
    }

    pub async fn get_count_type(&self, id: i32) -> Result<count_type::Model, ServiceError> {
        count_type::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Count type {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn update_count_type(
        &self,
        id: i32,
        input: UpdateCountType,
    ) -> Result<count_type::Model, ServiceError> {
        input.validate()?;
        let model = self.get_count_type(id).await?;

        let mut active = model.clone().into_active_model();
        if let Some(label) = input.label {
            active.label = Set(label);
        }
        if !active.is_changed() {
            return Ok(model);
        }
        let updated = active
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::write_error(e, "Count type label already in use"))?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_count_type(&self, id: i32) -> Result<(), ServiceError> {
        let model = self.get_count_type(id).await?;
        model.delete(&*self.db).await.map_err(|e| {
            ServiceError::delete_error(e, format!("Count type {id} is still referenced"))
        })?;
        info!(id, "count type deleted");
        Ok(())
    }

    // Count tags

    #[instrument(skip(self))]
    pub async fn create_count_tag(
        &self,
        input: CreateCountTag,
    ) -> Result<count_tag::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        self.get_count_type(input.parent_id).await?;

        let existing = count_tag::Entity::find()
            .filter(count_tag::Column::Path.eq(input.path.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Count tag '{}' already exists",
                input.path
            )));
        }

        let created = count_tag::ActiveModel {
            path: Set(input.path.clone()),
            parent_id: Set(input.parent_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| {
            ServiceError::write_error(e, format!("Count tag '{}' already exists", input.path))
        })?;
        Ok(created)
    }

    pub async fn list_count_tags(&self) -> Result<Vec<count_tag::Model>, ServiceError> {
        let items = count_tag::Entity::find()
            .order_by_asc(count_tag::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(items)
    }

    pub async fn get_count_tag(&self, id: i32) -> Result<count_tag::Model, ServiceError> {
        count_tag::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Count tag {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn update_count_tag(
        &self,
        id: i32,
        input: UpdateCountTag,
    ) -> Result<count_tag::Model, ServiceError> {
        input.validate()?;
        let model = self.get_count_tag(id).await?;

        if let Some(parent_id) = input.parent_id {
            self.get_count_type(parent_id).await?;
        }

        let mut active = model.clone().into_active_model();
        if let Some(path) = input.path {
            active.path = Set(path);
        }
        if let Some(parent_id) = input.parent_id {
            active.parent_id = Set(parent_id);
        }
        if !active.is_changed() {
            return Ok(model);
        }
        let updated = active
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::write_error(e, "Count tag path already in use"))?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_count_tag(&self, id: i32) -> Result<(), ServiceError> {
        let model = self.get_count_tag(id).await?;
        model.delete(&*self.db).await.map_err(|e| {
            ServiceError::delete_error(e, format!("Count tag {id} is still referenced"))
        })?;
        info!(id, "count tag deleted");
        Ok(())
    }

    // Count history (append-only)

    /// Record a count event. The tag must report into the supplied count
    /// type; a run-scoped count recomputes that run's metrics before
    /// returning.
    #[instrument(skip(self))]
    pub async fn record_count(
        &self,
        input: CreateCountHistory,
    ) -> Result<count_history::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let tag = self.get_count_tag(input.tag_id).await?;
        self.get_count_type(input.count_type_id).await?;

        if tag.parent_id != input.count_type_id {
            return Err(ServiceError::ValidationError(format!(
                "Count tag {} belongs to count type {}, not {}",
                tag.id, tag.parent_id, input.count_type_id
            )));
        }

        if let Some(run_id) = input.run_id {
            let run = run::Entity::find_by_id(run_id).one(db).await?;
            if run.is_none() {
                return Err(ServiceError::NotFound(format!("Run {run_id} not found")));
            }
        }

        let created = count_history::ActiveModel {
            timestamp: Set(input.timestamp),
            count: Set(input.count),
            tag_id: Set(input.tag_id),
            count_type_id: Set(input.count_type_id),
            run_id: Set(input.run_id),
            ..Default::default()
        }
        .insert(db)
        .await?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::CountRecorded {
                    run_id: created.run_id,
                    count: created.count,
                })
                .await;
        }

        // Derived metrics must never lag the log feeding them.
        if let Some(run_id) = created.run_id {
            self.metrics.recompute_for_run(run_id).await?;
        }

        Ok(created)
    }

    pub async fn list_count_histories(
        &self,
        run_id: Option<i32>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<count_history::Model>, u64), ServiceError> {
        let db = &*self.db;
        let mut condition = sea_orm::Condition::all();
        if let Some(run_id) = run_id {
            condition = condition.add(count_history::Column::RunId.eq(run_id));
        }

        let total = count_history::Entity::find()
            .filter(condition.clone())
            .count(db)
            .await?;
        let items = count_history::Entity::find()
            .filter(condition)
            .order_by_asc(count_history::Column::Timestamp)
            .offset(page.saturating_sub(1) * per_page)
            .limit(per_page)
            .all(db)
            .await?;
        Ok((items, total))
    }
}
