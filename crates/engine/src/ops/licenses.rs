//! The "pay for cards" batch: trade garden balance for per-card license
//! extensions.
//!
//! Validate-then-commit: every check runs before the first write, and all
//! writes share one DB transaction, so a failure anywhere leaves no ledger
//! entries, no license changes and the balance untouched.

use chrono::{Duration, Utc};
use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{
    EngineError, Money, PayForCardsCmd, PaymentKind, RecordPaymentCmd, ResultEngine, cards,
    cities, countries, payments,
};

use super::{Engine, with_tx};

/// One activated card.
#[derive(Clone, Debug, PartialEq)]
pub struct CardActivation {
    pub card_id: String,
    pub payment_id: String,
    pub transaction_number: String,
    pub license: cards::License,
    pub license_until: chrono::DateTime<Utc>,
}

/// Outcome of a successful batch.
#[derive(Clone, Debug, PartialEq)]
pub struct LicensePurchase {
    pub garden_id: String,
    pub tariff: Money,
    pub total: Money,
    pub cards: Vec<CardActivation>,
}

impl Engine {
    /// Pays for card licenses out of the garden balance, all cards or none.
    ///
    /// Steps:
    /// 1. resolve the garden's country tariff (`<= 0` means not configured);
    /// 2. every card must belong to the garden via its group, else the whole
    ///    batch is rejected listing the offending ids;
    /// 3. the balance must cover `tariff * cards`, else the shortage is
    ///    reported;
    /// 4. one completed `garden_card_change` ledger entry of `-tariff` per
    ///    card, license set to one year from now;
    /// 5. one deduction of the total from the garden balance, floored at 0.
    pub async fn pay_for_cards(&self, cmd: PayForCardsCmd) -> ResultEngine<LicensePurchase> {
        if cmd.card_ids.is_empty() {
            return Err(EngineError::InvalidAmount(
                "card_ids must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let garden = self.require_garden(&db_tx, &cmd.garden_id).await?;

            let city = cities::Entity::find_by_id(garden.city_id.clone())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("city not exists".to_string()))?;
            let country = countries::Entity::find_by_id(city.country_id.clone())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("country not exists".to_string()))?;

            let tariff = Money::new(country.tariff_minor);
            if !tariff.is_positive() {
                return Err(EngineError::NotConfigured(format!(
                    "tariff not configured for country {}",
                    country.name
                )));
            }

            // Step 2: collect every violation before rejecting, so the
            // caller sees the full list of offending ids at once.
            let mut offending: Vec<String> = Vec::new();
            let mut card_models: Vec<cards::Model> = Vec::with_capacity(cmd.card_ids.len());
            for card_id in &cmd.card_ids {
                match cards::Entity::find_by_id(card_id.clone()).one(&db_tx).await? {
                    None => offending.push(card_id.clone()),
                    Some(card) => {
                        let owner = self.card_garden_id(&db_tx, &card).await?;
                        if owner != cmd.garden_id {
                            offending.push(card_id.clone());
                        } else {
                            card_models.push(card);
                        }
                    }
                }
            }
            if !offending.is_empty() {
                return Err(EngineError::OwnershipMismatch(format!(
                    "cards not belonging to garden {}: {}",
                    cmd.garden_id,
                    offending.join(", ")
                )));
            }

            let count = card_models.len() as i64;
            let total = tariff.checked_mul(count).ok_or_else(|| {
                EngineError::InvalidAmount("total cost overflows".to_string())
            })?;
            let balance = Money::new(garden.balance_minor);
            if balance < total {
                return Err(EngineError::InsufficientBalance {
                    missing_minor: (total - balance).minor(),
                });
            }

            let license_until = Utc::now() + Duration::days(365);
            let mut activations = Vec::with_capacity(card_models.len());
            for card in &card_models {
                let mut record = RecordPaymentCmd::new(
                    PaymentKind::GardenCardChange,
                    payments::STATUS_COMPLETED,
                    -tariff,
                )
                .card_id(card.id.clone())
                .currency(country.currency.clone());
                if let Some(comment) = cmd.comment.as_deref() {
                    record = record.comment(comment);
                }
                let payment = self.record_payment_in(&db_tx, record).await?;

                let card_active = cards::ActiveModel {
                    id: ActiveValue::Set(card.id.clone()),
                    license_kind: ActiveValue::Set("date".to_string()),
                    license_active: ActiveValue::Set(true),
                    license_until: ActiveValue::Set(Some(license_until)),
                    ..Default::default()
                };
                let updated = card_active.update(&db_tx).await?;

                activations.push(CardActivation {
                    card_id: card.id.clone(),
                    payment_id: payment.id.to_string(),
                    transaction_number: payment.transaction_number,
                    license: updated.license()?,
                    license_until,
                });
            }

            // Step 5: the card entries above are card-targeted and inert to
            // the reconciler; the whole batch settles in this one deduction.
            self.apply_balance_delta(&db_tx, &cmd.garden_id, -total)
                .await?;

            tracing::info!(
                garden_id = %cmd.garden_id,
                cards = activations.len(),
                total_minor = total.minor(),
                "card licenses paid"
            );
            Ok(LicensePurchase {
                garden_id: cmd.garden_id,
                tariff,
                total,
                cards: activations,
            })
        })
    }
}
