use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    entities::{line, run, state_history, state_reason},
    errors::ServiceError,
    events::{Event, EventSender},
    services::metrics::MetricsService,
};

/// Downtime reason tree and the append-only state log.
#[derive(Clone)]
pub struct DowntimeService {
    db: Arc<DatabaseConnection>,
    metrics: Arc<MetricsService>,
    event_sender: Option<EventSender>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStateReason {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[serde(default)]
    pub record_downtime: bool,
    #[serde(default)]
    pub planned_downtime: bool,
    #[serde(default = "default_operator_selectable")]
    pub operator_selectable: bool,
    pub parent_id: Option<i32>,
}

fn default_operator_selectable() -> bool {
    true
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStateReason {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub code: Option<String>,
    pub record_downtime: Option<bool>,
    pub planned_downtime: Option<bool>,
    pub operator_selectable: Option<bool>,
    pub parent_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStateHistory {
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: Option<DateTime<Utc>>,
    pub state_reason_id: i32,
    pub line_id: Option<i32>,
    pub run_id: Option<i32>,
}

impl DowntimeService {
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

    // State reasons

    #[instrument(skip(self))]
    pub async fn create_state_reason(
        &self,
        input: CreateStateReason,
    ) -> Result<state_reason::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        if let Some(parent_id) = input.parent_id {
            self.get_state_reason(parent_id).await.map_err(|_| {
                ServiceError::NotFound(format!("Parent state reason {parent_id} not found"))
            })?;
        }

        let existing = state_reason::Entity::find()
            .filter(state_reason::Column::Code.eq(input.code.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "State reason with code '{}' already exists",
                input.code
            )));
        }

        let created = state_reason::ActiveModel {
            name: Set(input.name),
            code: Set(input.code.clone()),
            record_downtime: Set(input.record_downtime),
            planned_downtime: Set(input.planned_downtime),
            operator_selectable: Set(input.operator_selectable),
            parent_id: Set(input.parent_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| {
            ServiceError::write_error(
                e,
                format!("State reason with code '{}' already exists", input.code),
            )
        })?;

        info!(id = created.id, code = %created.code, "state reason created");
        Ok(created)
    }

    pub async fn list_state_reasons(&self) -> Result<Vec<state_reason::Model>, ServiceError> {
        let items = state_reason::Entity::find()
            .order_by_asc(state_reason::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(items)
    }

    pub async fn get_state_reason(&self, id: i32) -> Result<state_reason::Model, ServiceError> {
        state_reason::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("State reason {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn update_state_reason(
        &self,
        id: i32,
        input: UpdateStateReason,
    ) -> Result<state_reason::Model, ServiceError> {
        input.validate()?;
        let model = self.get_state_reason(id).await?;

        if let Some(parent_id) = input.parent_id {
            self.get_state_reason(parent_id).await.map_err(|_| {
                ServiceError::NotFound(format!("Parent state reason {parent_id} not found"))
            })?;
            self.ensure_no_cycle(id, parent_id).await?;
        }

        let mut active = model.clone().into_active_model();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(code) = input.code {
            active.code = Set(code);
        }
        if let Some(record_downtime) = input.record_downtime {
            active.record_downtime = Set(record_downtime);
        }
        if let Some(planned_downtime) = input.planned_downtime {
            active.planned_downtime = Set(planned_downtime);
        }
        if let Some(operator_selectable) = input.operator_selectable {
            active.operator_selectable = Set(operator_selectable);
        }
        if let Some(parent_id) = input.parent_id {
            active.parent_id = Set(Some(parent_id));
        }
        if !active.is_changed() {
            return Ok(model);
        }
        let updated = active
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::write_error(e, "State reason code already in use"))?;
        Ok(updated)
    }

    /// Delete a reason. Reasons with sub-reasons are rejected so the tree is
    /// never silently orphaned.
    #[instrument(skip(self))]
    pub async fn delete_state_reason(&self, id: i32) -> Result<(), ServiceError> {
        let db = &*self.db;
        let model = self.get_state_reason(id).await?;

        let child_count = state_reason::Entity::find()
            .filter(state_reason::Column::ParentId.eq(id))
            .count(db)
            .await?;
        if child_count > 0 {
            return Err(ServiceError::Conflict(format!(
                "State reason {id} has {child_count} sub-reasons and cannot be deleted"
            )));
        }

        model.delete(db).await.map_err(|e| {
            ServiceError::delete_error(e, format!("State reason {id} is referenced by history"))
        })?;
        info!(id, "state reason deleted");
        Ok(())
    }

    /// Direct children of a reason, unordered.
    pub async fn list_sub_reasons(&self, id: i32) -> Result<Vec<state_reason::Model>, ServiceError> {
        self.get_state_reason(id).await?;
        let children = state_reason::Entity::find()
            .filter(state_reason::Column::ParentId.eq(id))
            .all(&*self.db)
            .await?;
        Ok(children)
    }

    /// Chain of reasons from the root down to (and including) the given one.
    pub async fn resolve_path(&self, id: i32) -> Result<Vec<state_reason::Model>, ServiceError> {
        let mut chain = vec![self.get_state_reason(id).await?];
        let mut visited: HashSet<i32> = HashSet::from([id]);

        while let Some(parent_id) = chain.last().and_then(|r| r.parent_id) {
            if !visited.insert(parent_id) {
                return Err(ServiceError::InternalError(format!(
                    "State reason {id} has a cyclic ancestry"
                )));
            }
            chain.push(self.get_state_reason(parent_id).await?);
        }

        chain.reverse();
        Ok(chain)
    }

    /// Reject a parent assignment that would make `id` its own ancestor.
    async fn ensure_no_cycle(&self, id: i32, new_parent_id: i32) -> Result<(), ServiceError> {
        if id == new_parent_id {
            return Err(ServiceError::ValidationError(format!(
                "State reason {id} cannot be its own parent"
            )));
        }

        let mut visited: HashSet<i32> = HashSet::from([new_parent_id]);
        let mut current = self.get_state_reason(new_parent_id).await?.parent_id;
        while let Some(ancestor_id) = current {
            if ancestor_id == id {
                return Err(ServiceError::ValidationError(format!(
                    "Assigning parent {new_parent_id} to state reason {id} would create a cycle"
                )));
            }
            if !visited.insert(ancestor_id) {
                break;
            }
            current = self.get_state_reason(ancestor_id).await?.parent_id;
        }
        Ok(())
    }

    // State history (append-only)

    /// Record a downtime/state interval. The reason's name and code are
    /// copied onto the row at write time; a run-scoped interval recomputes
    /// that run's metrics before returning.
    #[instrument(skip(self))]
    pub async fn record_state(
        &self,
        input: CreateStateHistory,
    ) -> Result<state_history::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        if let Some(end) = input.end_datetime {
            if end < input.start_datetime {
                return Err(ServiceError::InvalidInput(format!(
                    "State end ({}) cannot be before state start ({})",
                    end, input.start_datetime
                )));
            }
        }

        let reason = self.get_state_reason(input.state_reason_id).await?;

        if let Some(line_id) = input.line_id {
            let found = line::Entity::find_by_id(line_id).one(db).await?;
            if found.is_none() {
                return Err(ServiceError::NotFound(format!("Line {line_id} not found")));
            }
        }
        if let Some(run_id) = input.run_id {
            let found = run::Entity::find_by_id(run_id).one(db).await?;
            if found.is_none() {
                return Err(ServiceError::NotFound(format!("Run {run_id} not found")));
            }
        }

        let created = state_history::ActiveModel {
            start_datetime: Set(input.start_datetime),
            end_datetime: Set(input.end_datetime),
            state_reason_id: Set(reason.id),
            reason_name: Set(reason.name.clone()),
            reason_code: Set(reason.code.clone()),
            line_id: Set(input.line_id),
            run_id: Set(input.run_id),
            ..Default::default()
        }
        .insert(db)
        .await?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::DowntimeRecorded {
                    run_id: created.run_id,
                    reason_code: created.reason_code.clone(),
                })
                .await;
        }

        // Derived metrics must never lag the log feeding them.
        if let Some(run_id) = created.run_id {
            self.metrics.recompute_for_run(run_id).await?;
        }

        Ok(created)
    }

    pub async fn list_state_histories(
        &self,
        run_id: Option<i32>,
        line_id: Option<i32>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<state_history::Model>, u64), ServiceError> {
        let db = &*self.db;
        let mut condition = sea_orm::Condition::all();
        if let Some(run_id) = run_id {
            condition = condition.add(state_history::Column::RunId.eq(run_id));
        }
        if let Some(line_id) = line_id {
            condition = condition.add(state_history::Column::LineId.eq(line_id));
        }

        let total = state_history::Entity::find()
            .filter(condition.clone())
            .count(db)
            .await?;
        let items = state_history::Entity::find()
            .filter(condition)
            .order_by_asc(state_history::Column::StartDatetime)
            .offset(page.saturating_sub(1) * per_page)
            .limit(per_page)
            .all(db)
            .await?;
        Ok((items, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn reason(id: i32, code: &str, parent_id: Option<i32>) -> state_reason::Model {
        state_reason::Model {
            id,
            name: format!("Reason {id}"),
            code: code.to_string(),
            record_downtime: true,
            planned_downtime: false,
            operator_selectable: true,
            parent_id,
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> DowntimeService {
        let db = Arc::new(db);
        let metrics = Arc::new(MetricsService::new(
            db.clone(),
            None,
            "Good".to_string(),
            "Scrap".to_string(),
        ));
        DowntimeService::new(db, metrics, None)
    }

    #[tokio::test]
    async fn duplicate_reason_code_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![reason(1, "MAINT", None)]])
            .into_connection();

        let err = service(db)
            .create_state_reason(CreateStateReason {
                name: "Maintenance".into(),
                code: "MAINT".into(),
                record_downtime: true,
                planned_downtime: true,
                operator_selectable: true,
                parent_id: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn parenting_under_own_descendant_is_rejected() {
        // Tree: 1 -> 2 (parent 1). Re-parenting 1 under 2 would be a cycle.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![reason(1, "ROOT", None)]]) // fetch target
            .append_query_results([vec![reason(2, "CHILD", Some(1))]]) // parent exists
            .append_query_results([vec![reason(2, "CHILD", Some(1))]]) // walk start
            .into_connection();

        let err = service(db)
            .update_state_reason(
                1,
                UpdateStateReason {
                    parent_id: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn self_parenting_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![reason(1, "ROOT", None)]]) // fetch target
            .append_query_results([vec![reason(1, "ROOT", None)]]) // parent exists
            .into_connection();

        let err = service(db)
            .update_state_reason(
                1,
                UpdateStateReason {
                    parent_id: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn deleting_reason_with_children_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![reason(1, "ROOT", None)]])
            .append_query_results([vec![maplit_count(2)]])
            .into_connection();

        let err = service(db).delete_state_reason(1).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    // MockDatabase returns counts as rows with a num_items column.
    fn maplit_count(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        std::collections::BTreeMap::from([("num_items", sea_orm::Value::BigInt(Some(n)))])
    }
}
