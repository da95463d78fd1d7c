use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Association between a product code and a line able to produce it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_code_line")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub product_code_id: i32,
    pub line_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_code::Entity",
        from = "Column::ProductCodeId",
        to = "super::product_code::Column::Id"
    )]
    ProductCode,
    #[sea_orm(
        belongs_to = "super::line::Entity",
        from = "Column::LineId",
        to = "super::line::Column::Id"
    )]
    Line,
}

impl Related<super::product_code::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductCode.def()
    }
}

impl Related<super::line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Line.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
