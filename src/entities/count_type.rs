use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Classification of count events, e.g. "Good" or "Scrap".
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "count_type")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub label: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::count_tag::Entity")]
    CountTag,
    #[sea_orm(has_many = "super::count_history::Entity")]
    CountHistory,
}

impl Related<super::count_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CountTag.def()
    }
}

impl Related<super::count_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CountHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
