use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only log of count events. Rows are never updated or deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "count_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub timestamp: DateTime<Utc>,
    pub count: i32,
    pub tag_id: i32,
    pub count_type_id: i32,
    pub run_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::count_tag::Entity",
        from = "Column::TagId",
        to = "super::count_tag::Column::Id"
    )]
    CountTag,
    #[sea_orm(
        belongs_to = "super::count_type::Entity",
        from = "Column::CountTypeId",
        to = "super::count_type::Column::Id"
    )]
    CountType,
    #[sea_orm(
        belongs_to = "super::run::Entity",
        from = "Column::RunId",
        to = "super::run::Column::Id"
    )]
    Run,
}

impl Related<super::count_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CountTag.def()
    }
}

impl Related<super::count_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CountType.def()
    }
}

impl Related<super::run::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Run.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
