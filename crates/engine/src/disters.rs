//! Disters (resellers) and their garden assignments.
//!
//! The hierarchy is fixed at two levels: a dister either has no parent
//! (root/first-level) or exactly one parent via `main_dister_id`
//! (child/second-level). No deeper nesting is modeled, so the back-reference
//! is a plain `Option`, not a recursive tree.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "disters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub country_id: String,
    /// Revenue-share percentage kept by this dister (whole percents).
    pub percent: i64,
    /// Revenue-share percentage forwarded to the parent dister.
    pub second_percent: i64,
    pub main_dister_id: Option<String>,
}

impl Model {
    /// A dister with a parent is "child"/second-level; without, "root".
    pub fn is_child(&self) -> bool {
        self.main_dister_id.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::countries::Entity",
        from = "Column::CountryId",
        to = "super::countries::Column::Id"
    )]
    Countries,
    #[sea_orm(has_many = "super::dister_gardens::Entity")]
    DisterGardens,
}

impl Related<super::countries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Countries.def()
    }
}

impl Related<super::dister_gardens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DisterGardens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
