//! The balance reconciler: the only code allowed to mutate a garden balance.
//!
//! Driven exclusively by payment status transitions (never by repeated
//! writes of the same status). The balance update is a single atomic SQL
//! statement, so two transitions racing on the same garden serialize in
//! the database instead of lost-updating each other.

use sea_orm::{ConnectionTrait, DatabaseTransaction, Statement, prelude::*};

use crate::{Money, Payment, ResultEngine, gardens, payments};

use super::Engine;

impl Engine {
    /// Applies the balance effect of a `(old_status -> new_status)` change.
    ///
    /// - transition into `completed`, kind affecting balance: credit the
    ///   signed amount;
    /// - transition out of `completed`: reverse it;
    /// - everything else: no-op.
    ///
    /// `old_status = None` means the payment was just created with
    /// `new_status`.
    ///
    /// Only payments referencing a garden directly move a balance; the
    /// card-targeted entries written by the license activator are settled
    /// by its own single deduction.
    pub(super) async fn reconcile_transition(
        &self,
        db_tx: &DatabaseTransaction,
        payment: &Payment,
        old_status: Option<&str>,
        new_status: &str,
    ) -> ResultEngine<()> {
        if !payment.kind.affects_balance() {
            return Ok(());
        }
        let Some(garden_id) = payment.garden_id.as_deref() else {
            return Ok(());
        };

        let was_completed = old_status == Some(payments::STATUS_COMPLETED);
        let is_completed = new_status == payments::STATUS_COMPLETED;

        let delta = match (was_completed, is_completed) {
            (false, true) => payment.amount(),
            (true, false) => -payment.amount(),
            _ => return Ok(()),
        };

        self.apply_balance_delta(db_tx, garden_id, delta).await
    }

    /// Adds `delta` to a garden balance, floored at zero.
    ///
    /// The floor clamp silently absorbs an over-debit; a clamped debit can
    /// therefore not be exactly reversed later. That asymmetry matches the
    /// product rule and is only logged, never "fixed" here.
    pub(super) async fn apply_balance_delta(
        &self,
        db_tx: &DatabaseTransaction,
        garden_id: &str,
        delta: Money,
    ) -> ResultEngine<()> {
        if delta.is_zero() {
            return Ok(());
        }

        let garden = self.require_garden(db_tx, garden_id).await?;
        let (expected, clamped) = Money::new(garden.balance_minor).clamped_add(delta);
        if clamped {
            tracing::warn!(
                garden_id,
                balance_minor = garden.balance_minor,
                delta_minor = delta.minor(),
                "balance floor clamp absorbed part of a debit"
            );
        }

        // Atomic even under a concurrent transition: the MAX() runs against
        // the current row value, not the one read above.
        let backend = db_tx.get_database_backend();
        db_tx
            .execute(Statement::from_sql_and_values(
                backend,
                "UPDATE gardens SET balance_minor = MAX(0, balance_minor + ?) WHERE id = ?",
                [delta.minor().into(), garden_id.into()],
            ))
            .await?;

        tracing::debug!(
            garden_id,
            delta_minor = delta.minor(),
            new_balance_minor = expected.minor(),
            "garden balance reconciled"
        );
        Ok(())
    }

    /// Returns the current balance of a garden in minor units.
    pub async fn garden_balance(&self, garden_id: &str) -> ResultEngine<Money> {
        let garden = gardens::Entity::find_by_id(garden_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| crate::EngineError::KeyNotFound("garden not exists".to_string()))?;
        Ok(Money::new(garden.balance_minor))
    }
}
