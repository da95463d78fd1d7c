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
        line, run,
        schedule::{self, ScheduleType},
        work_order,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Production schedules and the runs executing them.
#[derive(Clone)]
pub struct SchedulingService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSchedule {
    pub line_id: i32,
    pub work_order_id: Option<i32>,
    pub schedule_type: ScheduleType,
    pub schedule_start_datetime: DateTime<Utc>,
    pub schedule_finish_datetime: DateTime<Utc>,
    #[validate(length(max = 255))]
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSchedule {
    pub schedule_type: Option<ScheduleType>,
    pub schedule_start_datetime: Option<DateTime<Utc>>,
    pub schedule_finish_datetime: Option<DateTime<Utc>>,
    #[validate(length(max = 255))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRun {
    pub schedule_id: i32,
    pub run_start_datetime: DateTime<Utc>,
}

/// Only the stop time and status of a run are mutable. A supplied status of
/// "completed" (any casing) closes the run; other statuses reopen it; an
/// absent status leaves `closed` untouched.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateRun {
    pub run_stop_datetime: Option<DateTime<Utc>>,
    #[validate(length(min = 1, max = 20))]
    pub status: Option<String>,
}

impl SchedulingService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    // Schedules

    #[instrument(skip(self))]
    pub async fn create_schedule(
        &self,
        input: CreateSchedule,
    ) -> Result<schedule::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        if input.schedule_finish_datetime < input.schedule_start_datetime {
            return Err(ServiceError::InvalidInput(format!(
                "Schedule finish ({}) cannot be before schedule start ({})",
                input.schedule_finish_datetime, input.schedule_start_datetime
            )));
        }

        let line = line::Entity::find_by_id(input.line_id).one(db).await?;
        if line.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Line {} not found",
                input.line_id
            )));
        }

        if let Some(work_order_id) = input.work_order_id {
            let order = work_order::Entity::find_by_id(work_order_id).one(db).await?;
            if order.is_none() {
                return Err(ServiceError::NotFound(format!(
                    "Work order {work_order_id} not found"
                )));
            }
        }

        let created = schedule::ActiveModel {
            line_id: Set(input.line_id),
            work_order_id: Set(input.work_order_id),
            schedule_type: Set(input.schedule_type),
            schedule_start_datetime: Set(input.schedule_start_datetime),
            schedule_finish_datetime: Set(input.schedule_finish_datetime),
            note: Set(input.note),
            ..Default::default()
        }
        .insert(db)
        .await?;

        self.emit(Event::ScheduleCreated(created.id)).await;
        info!(id = created.id, line_id = created.line_id, "schedule created");
        Ok(created)
    }

    pub async fn list_schedules(
        &self,
        line_id: Option<i32>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<schedule::Model>, u64), ServiceError> {
        let db = &*self.db;
        let mut condition = sea_orm::Condition::all();
        if let Some(line_id) = line_id {
            condition = condition.add(schedule::Column::LineId.eq(line_id));
        }

        let total = schedule::Entity::find()
            .filter(condition.clone())
            .count(db)
            .await?;
        let items = schedule::Entity::find()
            .filter(condition)
            .order_by_asc(schedule::Column::ScheduleStartDatetime)
            .offset(page.saturating_sub(1) * per_page)
            .limit(per_page)
            .all(db)
            .await?;
        Ok((items, total))
    }

    pub async fn get_schedule(&self, id: i32) -> Result<schedule::Model, ServiceError> {
        schedule::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Schedule {id} not found")))
    }

    /// Update a schedule window. Runs already created from it keep their
    /// estimated finish time; the snapshot is intentionally stale.
    #[instrument(skip(self))]
    pub async fn update_schedule(
        &self,
        id: i32,
        input: UpdateSchedule,
    ) -> Result<schedule::Model, ServiceError> {
        input.validate()?;
        let model = self.get_schedule(id).await?;

        let mut active = model.clone().into_active_model();
        if let Some(schedule_type) = input.schedule_type {
            active.schedule_type = Set(schedule_type);
        }
        if let Some(start) = input.schedule_start_datetime {
            active.schedule_start_datetime = Set(start);
        }
        if let Some(finish) = input.schedule_finish_datetime {
            active.schedule_finish_datetime = Set(finish);
        }
        if let Some(note) = input.note {
            active.note = Set(Some(note));
        }
        if !active.is_changed() {
            return Ok(model);
        }
        let updated = active.update(&*self.db).await?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_schedule(&self, id: i32) -> Result<(), ServiceError> {
        let model = self.get_schedule(id).await?;
        model.delete(&*self.db).await.map_err(|e| {
            ServiceError::delete_error(e, format!("Schedule {id} still has runs"))
        })?;
        info!(id, "schedule deleted");
        Ok(())
    }

    // Runs

    /// Create a run for a schedule. The run's estimated finish time is a
    /// one-time copy of the schedule's finish datetime.
    #[instrument(skip(self))]
    pub async fn create_run(&self, input: CreateRun) -> Result<run::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let parent = schedule::Entity::find_by_id(input.schedule_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Schedule {} not found", input.schedule_id))
            })?;

        let created = run::ActiveModel {
            schedule_id: Set(input.schedule_id),
            run_start_datetime: Set(input.run_start_datetime),
            run_stop_datetime: Set(None),
            closed: Set(false),
            estimated_finish_time: Set(Some(parent.schedule_finish_datetime)),
            ..Default::default()
        }
        .insert(db)
        .await?;

        self.emit(Event::RunCreated {
            run_id: created.id,
            schedule_id: created.schedule_id,
        })
        .await;
        info!(id = created.id, schedule_id = created.schedule_id, "run created");
        Ok(created)
    }

    pub async fn list_runs(
        &self,
        schedule_id: Option<i32>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<run::Model>, u64), ServiceError> {
        let db = &*self.db;
        let mut condition = sea_orm::Condition::all();
        if let Some(schedule_id) = schedule_id {
            condition = condition.add(run::Column::ScheduleId.eq(schedule_id));
        }

        let total = run::Entity::find().filter(condition.clone()).count(db).await?;
        let items = run::Entity::find()
            .filter(condition)
            .order_by_asc(run::Column::Id)
            .offset(page.saturating_sub(1) * per_page)
            .limit(per_page)
            .all(db)
            .await?;
        Ok((items, total))
    }

    pub async fn get_run(&self, id: i32) -> Result<run::Model, ServiceError> {
        run::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Run {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn update_run(&self, id: i32, input: UpdateRun) -> Result<run::Model, ServiceError> {
        input.validate()?;
        let model = self.get_run(id).await?;

        let mut active = model.clone().into_active_model();
        if let Some(stop) = input.run_stop_datetime {
            active.run_stop_datetime = Set(Some(stop));
        }
        let mut now_closed = None;
        if let Some(status) = &input.status {
            let closed = status.eq_ignore_ascii_case("completed");
            active.closed = Set(closed);
            now_closed = Some(closed);
        }

        if !active.is_changed() {
            return Ok(model);
        }
        let updated = active.update(&*self.db).await?;

        if now_closed == Some(true) {
            self.emit(Event::RunClosed(updated.id)).await;
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_run(&self, id: i32) -> Result<(), ServiceError> {
        let model = self.get_run(id).await?;
        model.delete(&*self.db).await.map_err(|e| {
            ServiceError::delete_error(e, format!("Run {id} still has history records"))
        })?;
        info!(id, "run deleted");
        Ok(())
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn dt(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
    }

    fn schedule_model(finish: DateTime<Utc>) -> schedule::Model {
        schedule::Model {
            id: 5,
            line_id: 1,
            work_order_id: None,
            schedule_type: ScheduleType::Planned,
            schedule_start_datetime: dt("2025-03-01 06:00:00"),
            schedule_finish_datetime: finish,
            note: None,
            created_at: dt("2025-02-28 12:00:00"),
        }
    }

    #[tokio::test]
    async fn run_snapshots_schedule_finish_time() {
        let finish = dt("2025-03-01 14:00:00");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![schedule_model(finish)]])
            .append_query_results([vec![run::Model {
                id: 9,
                schedule_id: 5,
                run_start_datetime: dt("2025-03-01 06:05:00"),
                run_stop_datetime: None,
                closed: false,
                estimated_finish_time: Some(finish),
            }]])
            .into_connection();

        let service = SchedulingService::new(Arc::new(db), None);
        let run = service
            .create_run(CreateRun {
                schedule_id: 5,
                run_start_datetime: dt("2025-03-01 06:05:00"),
            })
            .await
            .unwrap();

        assert_eq!(run.estimated_finish_time, Some(finish));
        assert!(!run.closed);
    }

    #[tokio::test]
    async fn run_creation_fails_for_missing_schedule() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<schedule::Model>::new()])
            .into_connection();

        let service = SchedulingService::new(Arc::new(db), None);
        let err = service
            .create_run(CreateRun {
                schedule_id: 42,
                run_start_datetime: dt("2025-03-01 06:05:00"),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn completed_status_closes_the_run() {
        let existing = run::Model {
            id: 9,
            schedule_id: 5,
            run_start_datetime: dt("2025-03-01 06:05:00"),
            run_stop_datetime: None,
            closed: false,
            estimated_finish_time: None,
        };
        let stopped = run::Model {
            run_stop_datetime: Some(dt("2025-03-01 13:55:00")),
            closed: true,
            ..existing.clone()
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing]])
            .append_query_results([vec![stopped]])
            .into_connection();

        let service = SchedulingService::new(Arc::new(db), None);
        let updated = service
            .update_run(
                9,
                UpdateRun {
                    run_stop_datetime: Some(dt("2025-03-01 13:55:00")),
                    status: Some("Completed".to_string()),
                },
            )
            .await
            .unwrap();

        assert!(updated.closed);
    }
}
