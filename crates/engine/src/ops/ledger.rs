//! The payment ledger: append-biased record creation and status transitions.
//!
//! `record` is the single entry point for new ledger rows; `update_status`
//! is the single entry point for lifecycle changes. Both gateway callbacks
//! and client status polls funnel into the same transition check, which is
//! what makes replays idempotent.

use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Payment, RecordPaymentCmd, ResultEngine, cities, gateways, payments,
};

use super::{Engine, with_tx};

/// Outcome of a status write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The new status equals the stored one; nothing was applied.
    Unchanged,
    /// A real transition was persisted (and reconciled when relevant).
    Applied { from: String, to: String },
}

impl Transition {
    pub fn changed(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

impl Engine {
    /// Records a new payment.
    ///
    /// The transaction number is the idempotency key: a duplicate submission
    /// (retried client request, replayed gateway callback) is rejected with
    /// [`EngineError::DuplicateTransaction`] and the ledger is unchanged.
    ///
    /// A payment created directly in `completed` status (the explicit
    /// balance-adjustment entry point) is reconciled immediately.
    pub async fn record_payment(&self, cmd: RecordPaymentCmd) -> ResultEngine<Payment> {
        with_tx!(self, |db_tx| {
            let payment = self.record_payment_in(&db_tx, cmd).await?;
            Ok(payment)
        })
    }

    pub(super) async fn record_payment_in(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: RecordPaymentCmd,
    ) -> ResultEngine<Payment> {
        let transaction_number = cmd
            .transaction_number
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let existing = payments::Entity::find()
            .filter(payments::Column::TransactionNumber.eq(transaction_number.clone()))
            .one(db_tx)
            .await?;
        if existing.is_some() {
            return Err(EngineError::DuplicateTransaction(transaction_number));
        }

        // Referential checks before the shape validation so "not found" wins
        // over "invalid shape" for dangling ids.
        if let Some(garden_id) = cmd.garden_id.as_deref() {
            self.require_garden(db_tx, garden_id).await?;
        }
        if let Some(card_id) = cmd.card_id.as_deref() {
            self.require_card(db_tx, card_id).await?;
        }

        let currency = match cmd.currency {
            Some(currency) => currency,
            None => {
                self.default_currency(db_tx, cmd.gateway_id.as_deref(), cmd.garden_id.as_deref())
                    .await?
            }
        };

        let payment = Payment::new(
            transaction_number,
            cmd.kind,
            cmd.status,
            cmd.amount,
            currency,
            cmd.garden_id,
            cmd.card_id,
            cmd.gateway_id,
            cmd.comment,
            Utc::now(),
        )?;

        payments::ActiveModel::from(&payment).insert(db_tx).await?;

        // Creation in `completed` is itself a transition into `completed`.
        if payment.is_completed() {
            self.reconcile_transition(db_tx, &payment, None, payments::STATUS_COMPLETED)
                .await?;
        }

        tracing::info!(
            payment_id = %payment.id,
            kind = payment.kind.as_str(),
            status = %payment.status,
            "payment recorded"
        );
        Ok(payment)
    }

    /// Applies a status transition to a payment.
    ///
    /// No-op when the stored status already equals `new_status`: repeated
    /// writes (replayed callbacks, concurrent polls) apply balance effects
    /// exactly once.
    pub async fn update_payment_status(
        &self,
        payment_id: &str,
        new_status: &str,
    ) -> ResultEngine<Transition> {
        with_tx!(self, |db_tx| {
            let model = self.require_payment_model(&db_tx, payment_id).await?;
            let transition = self
                .apply_status_in(&db_tx, model, new_status, None)
                .await?;
            Ok(transition)
        })
    }

    /// The shared transition core. Must be called inside the enclosing DB
    /// transaction so the status write and the balance update commit as one
    /// unit.
    pub(super) async fn apply_status_in(
        &self,
        db_tx: &DatabaseTransaction,
        model: payments::Model,
        new_status: &str,
        external_transaction_id: Option<String>,
    ) -> ResultEngine<Transition> {
        if model.status == new_status {
            return Ok(Transition::Unchanged);
        }

        let old_status = model.status.clone();
        let payment = Payment::try_from(model)?;

        let mut active = payments::ActiveModel {
            id: ActiveValue::Set(payment.id.to_string()),
            status: ActiveValue::Set(new_status.to_string()),
            updated_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        if let Some(tx_id) = external_transaction_id {
            active.external_transaction_id = ActiveValue::Set(Some(tx_id));
        }
        active.update(db_tx).await?;

        self.reconcile_transition(db_tx, &payment, Some(old_status.as_str()), new_status)
            .await?;

        tracing::info!(
            payment_id = %payment.id,
            from = %old_status,
            to = %new_status,
            "payment status transition"
        );
        Ok(Transition::Applied {
            from: old_status,
            to: new_status.to_string(),
        })
    }

    /// Returns a payment by its internal id.
    pub async fn payment(&self, payment_id: &str) -> ResultEngine<Payment> {
        let model = payments::Entity::find_by_id(payment_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("payment not exists".to_string()))?;
        Payment::try_from(model)
    }

    pub(super) async fn require_payment_model(
        &self,
        db_tx: &DatabaseTransaction,
        payment_id: &str,
    ) -> ResultEngine<payments::Model> {
        payments::Entity::find_by_id(payment_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("payment not exists".to_string()))
    }

    pub(super) async fn payment_model_by_external_order(
        &self,
        db_tx: &DatabaseTransaction,
        external_order_id: &str,
    ) -> ResultEngine<payments::Model> {
        payments::Entity::find()
            .filter(payments::Column::ExternalOrderId.eq(external_order_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("payment not exists".to_string()))
    }

    /// Currency fallback when a request names none: the gateway's currency,
    /// then the garden country's.
    async fn default_currency(
        &self,
        db_tx: &DatabaseTransaction,
        gateway_id: Option<&str>,
        garden_id: Option<&str>,
    ) -> ResultEngine<String> {
        if let Some(gateway_id) = gateway_id {
            if let Some(gateway) = gateways::Entity::find_by_id(gateway_id.to_string())
                .one(db_tx)
                .await?
            {
                return Ok(gateway.currency);
            }
        }

        if let Some(garden_id) = garden_id {
            let garden = self.require_garden(db_tx, garden_id).await?;
            if let Some(city) = cities::Entity::find_by_id(garden.city_id)
                .one(db_tx)
                .await?
            {
                if let Some(country) = city
                    .find_related(crate::countries::Entity)
                    .one(db_tx)
                    .await?
                {
                    return Ok(country.currency);
                }
            }
            return Ok(garden.currency);
        }

        Err(EngineError::InvalidAmount(
            "currency could not be resolved".to_string(),
        ))
    }
}

impl Engine {
    /// The explicit "create garden payment" entry point: a signed direct
    /// balance adjustment. Always recorded as a `garden_balance` payment,
    /// `completed` by default, so the reconciler applies it immediately.
    pub async fn adjust_garden_balance(
        &self,
        cmd: crate::AdjustBalanceCmd,
    ) -> ResultEngine<Payment> {
        let status = cmd
            .status
            .unwrap_or_else(|| payments::STATUS_COMPLETED.to_string());
        let mut record = RecordPaymentCmd::new(crate::PaymentKind::GardenBalance, status, cmd.amount)
            .garden_id(cmd.garden_id);
        if let Some(currency) = cmd.currency {
            record = record.currency(currency);
        }
        if let Some(comment) = cmd.comment {
            record = record.comment(comment);
        }
        self.record_payment(record).await
    }
}
