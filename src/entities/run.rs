use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Actual execution of a schedule.
///
/// `estimated_finish_time` is copied from the schedule at creation; later
/// schedule edits never touch it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "run")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub schedule_id: i32,
    pub run_start_datetime: DateTime<Utc>,
    pub run_stop_datetime: Option<DateTime<Utc>>,
    pub closed: bool,
    pub estimated_finish_time: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::schedule::Entity",
        from = "Column::ScheduleId",
        to = "super::schedule::Column::Id"
    )]
    Schedule,
    #[sea_orm(has_many = "super::count_history::Entity")]
    CountHistory,
    #[sea_orm(has_many = "super::state_history::Entity")]
    StateHistory,
    #[sea_orm(has_one = "super::run_metrics::Entity")]
    RunMetrics,
}

impl Related<super::schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedule.def()
    }
}

impl Related<super::count_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CountHistory.def()
    }
}

impl Related<super::state_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StateHistory.def()
    }
}

impl Related<super::run_metrics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RunMetrics.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
