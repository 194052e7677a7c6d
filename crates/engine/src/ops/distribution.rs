//! The distribution calculator: reporting-only revenue splits.
//!
//! Never touches balances. For a payment it resolves the garden, the owning
//! dister (lowest id wins when several disters claim the same garden, so the
//! report stays deterministic) and that dister's optional parent, then
//! splits the absolute amount.

use sea_orm::{QueryFilter, QueryOrder, prelude::*};

use crate::{Payment, ResultEngine, cards, dister_gardens, disters, groups};

use super::Engine;

/// One recipient's share.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistributionLine {
    pub dister_id: String,
    pub name: String,
    pub percent: i64,
    pub amount_minor: i64,
}

/// The full split for one payment. Percent and amount invariants:
/// `admin_percent + dister + second <= 100`, all amounts `>= 0`, and the
/// three amounts sum to the absolute payment amount.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistributionReport {
    pub payment_id: String,
    pub garden_id: Option<String>,
    pub admin_percent: i64,
    pub admin_amount_minor: i64,
    pub dister: Option<DistributionLine>,
    pub second_dister: Option<DistributionLine>,
}

/// Round-half-up percentage of an absolute minor amount.
fn share_minor(abs_minor: i64, percent: i64) -> i64 {
    (abs_minor * percent + 50) / 100
}

impl Engine {
    /// Computes the revenue split for a payment.
    pub async fn distribution(&self, payment_id: &str) -> ResultEngine<DistributionReport> {
        let payment = self.payment(payment_id).await?;
        let garden_id = self.resolve_payment_garden(&payment).await?;

        let abs_minor = payment.amount().abs_minor();

        let Some(garden_id) = garden_id else {
            // No garden, no dister: the platform keeps everything.
            return Ok(DistributionReport {
                payment_id: payment.id.to_string(),
                garden_id: None,
                admin_percent: 100,
                admin_amount_minor: abs_minor,
                dister: None,
                second_dister: None,
            });
        };

        let owning = dister_gardens::Entity::find()
            .filter(dister_gardens::Column::GardenId.eq(garden_id.clone()))
            .order_by_asc(dister_gardens::Column::DisterId)
            .one(&self.database)
            .await?;

        let dister_model = match owning {
            Some(link) => disters::Entity::find_by_id(link.dister_id)
                .one(&self.database)
                .await?,
            None => None,
        };

        let Some(dister_model) = dister_model else {
            return Ok(DistributionReport {
                payment_id: payment.id.to_string(),
                garden_id: Some(garden_id),
                admin_percent: 100,
                admin_amount_minor: abs_minor,
                dister: None,
                second_dister: None,
            });
        };

        let dister_percent = dister_model.percent.max(0);
        let second_percent = dister_model.second_percent.max(0);

        let dister_minor = share_minor(abs_minor, dister_percent);

        // The parent's line only exists when there is something to forward
        // and the parent's name actually resolves.
        let parent = match dister_model.main_dister_id.as_deref() {
            Some(parent_id) if second_percent > 0 => {
                disters::Entity::find_by_id(parent_id.to_string())
                    .one(&self.database)
                    .await?
            }
            _ => None,
        };

        let (second_line, second_minor, effective_second_percent) = match parent {
            Some(parent_model) => {
                let second_minor = share_minor(abs_minor, second_percent);
                (
                    Some(DistributionLine {
                        dister_id: parent_model.id,
                        name: parent_model.name,
                        percent: second_percent,
                        amount_minor: second_minor,
                    }),
                    second_minor,
                    second_percent,
                )
            }
            None => (None, 0, 0),
        };

        let admin_percent = (100 - dister_percent - effective_second_percent).max(0);
        let admin_amount_minor = (abs_minor - dister_minor - second_minor).max(0);

        Ok(DistributionReport {
            payment_id: payment.id.to_string(),
            garden_id: Some(garden_id),
            admin_percent,
            admin_amount_minor,
            dister: Some(DistributionLine {
                dister_id: dister_model.id,
                name: dister_model.name,
                percent: dister_percent,
                amount_minor: dister_minor,
            }),
            second_dister: second_line,
        })
    }

    /// Resolves a payment's garden: direct id, or card -> group -> garden.
    pub(super) async fn resolve_payment_garden(
        &self,
        payment: &Payment,
    ) -> ResultEngine<Option<String>> {
        if let Some(garden_id) = payment.garden_id.clone() {
            return Ok(Some(garden_id));
        }
        let Some(card_id) = payment.card_id.as_deref() else {
            return Ok(None);
        };
        let Some(card) = cards::Entity::find_by_id(card_id.to_string())
            .one(&self.database)
            .await?
        else {
            return Ok(None);
        };
        let Some(group) = groups::Entity::find_by_id(card.group_id)
            .one(&self.database)
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(group.garden_id))
    }
}
