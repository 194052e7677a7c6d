//! Payment primitives.
//!
//! A `Payment` is the append-biased ledger record of a monetary event: it is
//! created once, its `status` transitions 0..n times, and it is never deleted
//! by this subsystem. `amount_minor` is never mutated after creation.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

/// The single status value with balance semantics. Every other status string
/// (`pending`, `failed`, `cancelled`, ...) is inert to garden balances.
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_FAILED: &str = "failed";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Bank,
    GardenBalance,
    AgentBalance,
    GardenCardChange,
}

impl PaymentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::GardenBalance => "garden_balance",
            Self::AgentBalance => "agent_balance",
            Self::GardenCardChange => "garden_card_change",
        }
    }

    /// Whether a `completed` payment of this kind moves the garden balance.
    pub fn affects_balance(self) -> bool {
        matches!(self, Self::GardenBalance | Self::GardenCardChange)
    }
}

impl TryFrom<&str> for PaymentKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "bank" => Ok(Self::Bank),
            "garden_balance" => Ok(Self::GardenBalance),
            "agent_balance" => Ok(Self::AgentBalance),
            "garden_card_change" => Ok(Self::GardenCardChange),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid payment kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    /// Globally unique idempotency key, system- or caller-generated.
    pub transaction_number: String,
    pub kind: PaymentKind,
    pub status: String,
    pub amount_minor: i64,
    pub currency: String,
    pub garden_id: Option<String>,
    pub card_id: Option<String>,
    pub gateway_id: Option<String>,
    pub external_order_id: Option<String>,
    pub external_transaction_id: Option<String>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Builds a validated payment record.
    ///
    /// Shape rules:
    /// - the amount magnitude must be within bounds (corrupt-input guard);
    /// - `garden_balance` requires `garden_id` and forces `card_id` to `None`;
    /// - every other kind requires exactly one of `card_id` / `garden_id`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transaction_number: String,
        kind: PaymentKind,
        status: String,
        amount: Money,
        currency: String,
        garden_id: Option<String>,
        card_id: Option<String>,
        gateway_id: Option<String>,
        comment: Option<String>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if !amount.in_bounds() {
            return Err(EngineError::InvalidAmount(format!(
                "amount magnitude exceeds {}",
                Money::new(Money::MAX_MINOR)
            )));
        }
        if transaction_number.trim().is_empty() {
            return Err(EngineError::InvalidAmount(
                "transaction_number must not be empty".to_string(),
            ));
        }

        let (garden_id, card_id) = match kind {
            PaymentKind::GardenBalance => {
                let Some(garden_id) = garden_id else {
                    return Err(EngineError::InvalidAmount(
                        "garden_id is required for garden_balance payments".to_string(),
                    ));
                };
                // garden_balance payments never reference a card.
                (Some(garden_id), None)
            }
            _ => match (garden_id, card_id) {
                (Some(garden_id), None) => (Some(garden_id), None),
                (None, Some(card_id)) => (None, Some(card_id)),
                _ => {
                    return Err(EngineError::InvalidAmount(
                        "exactly one of card_id or garden_id is required".to_string(),
                    ));
                }
            },
        };

        Ok(Self {
            id: Uuid::new_v4(),
            transaction_number,
            kind,
            status,
            amount_minor: amount.minor(),
            currency,
            garden_id,
            card_id,
            gateway_id,
            external_order_id: None,
            external_transaction_id: None,
            comment,
            created_at,
            updated_at: created_at,
        })
    }

    pub fn amount(&self) -> Money {
        Money::new(self.amount_minor)
    }

    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_number: String,
    pub kind: String,
    pub status: String,
    pub amount_minor: i64,
    pub currency: String,
    pub garden_id: Option<String>,
    pub card_id: Option<String>,
    pub gateway_id: Option<String>,
    pub external_order_id: Option<String>,
    pub external_transaction_id: Option<String>,
    pub comment: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::gardens::Entity",
        from = "Column::GardenId",
        to = "super::gardens::Column::Id"
    )]
    Gardens,
    #[sea_orm(
        belongs_to = "super::cards::Entity",
        from = "Column::CardId",
        to = "super::cards::Column::Id"
    )]
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

impl From<&Payment> for ActiveModel {
    fn from(payment: &Payment) -> Self {
        Self {
            id: ActiveValue::Set(payment.id.to_string()),
            transaction_number: ActiveValue::Set(payment.transaction_number.clone()),
            kind: ActiveValue::Set(payment.kind.as_str().to_string()),
            status: ActiveValue::Set(payment.status.clone()),
            amount_minor: ActiveValue::Set(payment.amount_minor),
            currency: ActiveValue::Set(payment.currency.clone()),
            garden_id: ActiveValue::Set(payment.garden_id.clone()),
            card_id: ActiveValue::Set(payment.card_id.clone()),
            gateway_id: ActiveValue::Set(payment.gateway_id.clone()),
            external_order_id: ActiveValue::Set(payment.external_order_id.clone()),
            external_transaction_id: ActiveValue::Set(payment.external_transaction_id.clone()),
            comment: ActiveValue::Set(payment.comment.clone()),
            created_at: ActiveValue::Set(payment.created_at),
            updated_at: ActiveValue::Set(payment.updated_at),
        }
    }
}

impl TryFrom<Model> for Payment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&model.id)
            .map_err(|_| EngineError::InvalidAmount("invalid payment id".to_string()))?;
        let kind = PaymentKind::try_from(model.kind.as_str())?;
        Ok(Self {
            id,
            transaction_number: model.transaction_number,
            kind,
            status: model.status,
            amount_minor: model.amount_minor,
            currency: model.currency,
            garden_id: model.garden_id,
            card_id: model.card_id,
            gateway_id: model.gateway_id,
            external_order_id: model.external_order_id,
            external_transaction_id: model.external_transaction_id,
            comment: model.comment,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(kind: PaymentKind, garden: Option<&str>, card: Option<&str>) -> ResultEngine<Payment> {
        Payment::new(
            "tx-1".to_string(),
            kind,
            STATUS_PENDING.to_string(),
            Money::new(1000),
            "EUR".to_string(),
            garden.map(str::to_string),
            card.map(str::to_string),
            None,
            None,
            Utc::now(),
        )
    }

    #[test]
    fn garden_balance_requires_garden_and_drops_card() {
        assert!(base(PaymentKind::GardenBalance, None, Some("c")).is_err());

        let payment = Payment::new(
            "tx-2".to_string(),
            PaymentKind::GardenBalance,
            STATUS_PENDING.to_string(),
            Money::new(1000),
            "EUR".to_string(),
            Some("g".to_string()),
            Some("c".to_string()),
            None,
            None,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(payment.garden_id.as_deref(), Some("g"));
        assert_eq!(payment.card_id, None);
    }

    #[test]
    fn other_kinds_require_exactly_one_target() {
        assert!(base(PaymentKind::Bank, Some("g"), None).is_ok());
        assert!(base(PaymentKind::Bank, None, Some("c")).is_ok());
        assert!(base(PaymentKind::Bank, None, None).is_err());
        assert!(base(PaymentKind::Bank, Some("g"), Some("c")).is_err());
    }

    #[test]
    fn out_of_bounds_amount_rejected() {
        let res = Payment::new(
            "tx-3".to_string(),
            PaymentKind::Bank,
            STATUS_PENDING.to_string(),
            Money::new(Money::MAX_MINOR + 1),
            "EUR".to_string(),
            Some("g".to_string()),
            None,
            None,
            None,
            Utc::now(),
        );
        assert!(res.is_err());
    }
}
