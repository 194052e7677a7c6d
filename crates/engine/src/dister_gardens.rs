//! Join table: which gardens a dister is entitled to.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "dister_gardens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub dister_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub garden_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::disters::Entity",
        from = "Column::DisterId",
        to = "super::disters::Column::Id"
    )]
    Disters,
    #[sea_orm(
        belongs_to = "super::gardens::Entity",
        from = "Column::GardenId",
        to = "super::gardens::Column::Id"
    )]
    Gardens,
}

impl Related<super::disters::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Disters.def()
    }
}

impl Related<super::gardens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Gardens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
