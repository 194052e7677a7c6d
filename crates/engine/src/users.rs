//! Users table (minimal entity).
//!
//! The server's auth middleware resolves a row into an [`Actor`] once per
//! request; the engine itself only sees the capability, never the role
//! string.
//!
//! [`Actor`]: crate::Actor

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
    pub role: String,
    pub garden_id: Option<String>,
    pub dister_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
