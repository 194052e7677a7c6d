//! Gateway rows: which hosted-payment providers a deployment knows about.
//!
//! Credentials never live here; they come from the app settings and are
//! baked into the adapter registry at startup. A gateway row without a
//! registered adapter is "not configured".

use sea_orm::entity::prelude::*;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatewayKind {
    Bank,
    Ecomm,
}

impl GatewayKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::Ecomm => "ecomm",
        }
    }
}

impl TryFrom<&str> for GatewayKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "bank" => Ok(Self::Bank),
            "ecomm" => Ok(Self::Ecomm),
            other => Err(EngineError::KeyNotFound(format!(
                "unknown gateway kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "gateways")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub name: String,
    pub currency: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
