//! Cards and their license state.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// A card's license is either a plain boolean or a date-bounded value.
///
/// A completed "pay for cards" operation always writes the `Date` variant
/// set to one year from now.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum License {
    Boolean { value: bool },
    Date { value: DateTime<Utc> },
}

impl License {
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::Boolean { .. } => "boolean",
            Self::Date { .. } => "date",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub phone: Option<String>,
    pub license_kind: String,
    pub license_active: bool,
    pub license_until: Option<DateTimeUtc>,
}

impl Model {
    pub fn license(&self) -> Result<License, EngineError> {
        match self.license_kind.as_str() {
            "boolean" => Ok(License::Boolean {
                value: self.license_active,
            }),
            "date" => {
                let value = self.license_until.ok_or_else(|| {
                    EngineError::InvalidAmount("date license without a date".to_string())
                })?;
                Ok(License::Date { value })
            }
            other => Err(EngineError::InvalidAmount(format!(
                "invalid license kind: {other}"
            ))),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id"
    )]
    Groups,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
