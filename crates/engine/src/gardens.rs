//! The module contains the `Garden` struct and its entity.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{EngineError, Money};

/// A garden is a customer tenant whose balance funds card licenses.
///
/// The balance is non-negative by invariant: every mutation goes through the
/// reconciler, which floor-clamps at zero.
#[derive(Clone, Debug, PartialEq)]
pub struct Garden {
    pub id: Uuid,
    pub name: String,
    pub city_id: String,
    pub balance: Money,
    pub currency: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "gardens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub city_id: String,
    pub balance_minor: i64,
    pub currency: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cities::Entity",
        from = "Column::CityId",
        to = "super::cities::Column::Id"
    )]
    Cities,
    #[sea_orm(has_many = "super::groups::Entity")]
    Groups,
}

impl Related<super::cities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cities.def()
    }
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Garden {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&model.id)
            .map_err(|_| EngineError::InvalidAmount("invalid garden id".to_string()))?;
        Ok(Self {
            id,
            name: model.name,
            city_id: model.city_id,
            balance: Money::new(model.balance_minor),
            currency: model.currency,
        })
    }
}
