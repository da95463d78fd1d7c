use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Physical or logical count source, e.g. "Line1/GoodCount".
///
/// A tag belongs to exactly one count type; count events recorded against the
/// tag must carry that same type.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "count_tag")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub path: String,
    pub parent_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::count_type::Entity",
        from = "Column::ParentId",
        to = "super::count_type::Column::Id"
    )]
    CountType,
    #[sea_orm(has_many = "super::count_history::Entity")]
    CountHistory,
}

impl Related<super::count_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CountType.def()
    }
}

impl Related<super::count_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CountHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
