//! Card groups. A group belongs to a garden; cards reach their garden
//! through it.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub garden_id: String,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::gardens::Entity",
        from = "Column::GardenId",
        to = "super::gardens::Column::Id"
    )]
    Gardens,
    #[sea_orm(has_many = "super::cards::Entity")]
    Cards,
}

impl Related<super::gardens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Gardens.def()
    }
}

impl Related<super::cards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cards.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
