use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only log of downtime/state intervals.
///
/// `reason_name` and `reason_code` are copied from the reason at write time
/// so log queries need no join and later reason edits leave history intact.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "state_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: Option<DateTime<Utc>>,
    pub state_reason_id: i32,
    pub reason_name: String,
    pub reason_code: String,
    pub line_id: Option<i32>,
    pub run_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::state_reason::Entity",
        from = "Column::StateReasonId",
        to = "super::state_reason::Column::Id"
    )]
    StateReason,
    #[sea_orm(
        belongs_to = "super::line::Entity",
        from = "Column::LineId",
        to = "super::line::Column::Id"
    )]
    Line,
    #[sea_orm(
        belongs_to = "super::run::Entity",
        from = "Column::RunId",
        to = "super::run::Column::Id"
    )]
    Run,
}

impl Related<super::state_reason::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StateReason.def()
    }
}

impl Related<super::line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Line.def()
    }
}

impl Related<super::run::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Run.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
