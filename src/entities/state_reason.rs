use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Downtime/state reason, organized as a parent-pointered tree.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "state_reason")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub code: String,
    pub record_downtime: bool,
    pub planned_downtime: bool,
    pub operator_selectable: bool,
    pub parent_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id"
    )]
    Parent,
    #[sea_orm(has_many = "super::state_history::Entity")]
    StateHistory,
}

impl Related<super::state_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StateHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
