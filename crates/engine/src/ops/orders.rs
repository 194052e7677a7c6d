//! Hosted-checkout order lifecycle: creation, callbacks, status sync, bulk.
//!
//! Both the webhook path and the client poll path resolve the payment and
//! go through `apply_status_in`, so whichever arrives first wins and the
//! other becomes a no-op.

use sea_orm::{ActiveValue, QueryOrder, TransactionTrait, prelude::*};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    CreateOrderCmd, EngineError, GatewayKind, Money, Payment, PaymentKind, RecordPaymentCmd,
    ResultEngine, cities, countries, gateways, payments,
};

use super::{Engine, Transition, with_tx};

/// A registered order: the pending ledger entry plus where to send the user.
#[derive(Clone, Debug, PartialEq)]
pub struct CreatedPaymentOrder {
    pub payment: Payment,
    pub redirect_url: String,
    pub external_order_id: String,
}

/// Answer to a status poll.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderState {
    pub payment: Payment,
    /// Whether the remote gateway was queried during this poll.
    pub synced: bool,
}

/// Per-card result of a bulk order creation. Partial success is expected
/// and reported, never rolled back.
#[derive(Clone, Debug)]
pub struct BulkOrderOutcome {
    pub results: Vec<CardOrderResult>,
    pub success_count: usize,
    pub failed_count: usize,
}

#[derive(Clone, Debug)]
pub struct CardOrderResult {
    pub card_id: String,
    pub order: Option<CreatedPaymentOrder>,
    pub error: Option<String>,
}

impl Engine {
    /// Registers an order on an external gateway and records the pending
    /// ledger entry.
    ///
    /// Adapter failures happen before the ledger write: a rejected or
    /// unconfigured gateway leaves no payment behind.
    pub async fn create_order(&self, cmd: CreateOrderCmd) -> ResultEngine<CreatedPaymentOrder> {
        with_tx!(self, |db_tx| {
            let gateway_model = match cmd.gateway_id.as_deref() {
                Some(id) => gateways::Entity::find_by_id(id.to_string())
                    .one(&db_tx)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound("gateway not exists".to_string()))?,
                // Deterministic default: lowest id wins.
                None => gateways::Entity::find()
                    .order_by_asc(gateways::Column::Id)
                    .one(&db_tx)
                    .await?
                    .ok_or_else(|| {
                        EngineError::NotConfigured("no payment gateway available".to_string())
                    })?,
            };
            let kind = GatewayKind::try_from(gateway_model.kind.as_str())?;
            let adapter = self.gateways.get(kind)?;

            // Validate the target and derive the default amount before any
            // external call.
            let amount = match (&cmd.garden_id, &cmd.card_id) {
                (Some(garden_id), None) => {
                    self.require_garden(&db_tx, garden_id).await?;
                    cmd.amount.ok_or_else(|| {
                        EngineError::InvalidAmount(
                            "amount is required for garden orders".to_string(),
                        )
                    })?
                }
                (None, Some(card_id)) => {
                    let card = self.require_card(&db_tx, card_id).await?;
                    match cmd.amount {
                        Some(amount) => amount,
                        // A card order without an amount defaults to one
                        // license-year at the card country tariff.
                        None => self.card_tariff(&db_tx, &card).await?,
                    }
                }
                _ => {
                    return Err(EngineError::InvalidAmount(
                        "exactly one of card_id or garden_id is required".to_string(),
                    ));
                }
            };
            if !amount.is_positive() {
                return Err(EngineError::InvalidAmount(
                    "order amount must be positive".to_string(),
                ));
            }

            let currency = cmd
                .currency
                .unwrap_or_else(|| gateway_model.currency.clone());
            let transaction_number = Uuid::new_v4().to_string();

            let created = adapter
                .create_order(amount.minor(), &currency, &transaction_number)
                .await?;

            let mut record = RecordPaymentCmd::new(
                PaymentKind::Bank,
                payments::STATUS_PENDING,
                amount,
            )
            .transaction_number(transaction_number)
            .currency(currency)
            .gateway_id(gateway_model.id.clone());
            if let Some(garden_id) = cmd.garden_id {
                record = record.garden_id(garden_id);
            }
            if let Some(card_id) = cmd.card_id {
                record = record.card_id(card_id);
            }
            if let Some(description) = cmd.description {
                record = record.comment(description);
            }

            let mut payment = self.record_payment_in(&db_tx, record).await?;

            let active = payments::ActiveModel {
                id: ActiveValue::Set(payment.id.to_string()),
                external_order_id: ActiveValue::Set(Some(created.external_order_id.clone())),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            payment.external_order_id = Some(created.external_order_id.clone());

            Ok(CreatedPaymentOrder {
                payment,
                redirect_url: created.redirect_url,
                external_order_id: created.external_order_id,
            })
        })
    }

    /// Applies a gateway callback to the matching payment.
    ///
    /// Replays are tolerated: an identical callback resolves to the same
    /// status and hits the unchanged branch of the transition check.
    pub async fn handle_callback(
        &self,
        kind: GatewayKind,
        payload: &Value,
    ) -> ResultEngine<(Payment, Transition)> {
        let adapter = self.gateways.get(kind)?;
        let event = adapter.parse_callback(payload)?;

        with_tx!(self, |db_tx| {
            let model = self
                .payment_model_by_external_order(&db_tx, &event.external_order_id)
                .await?;
            let payment_id = model.id.clone();
            let transition = self
                .apply_status_in(
                    &db_tx,
                    model,
                    event.status.as_payment_status(),
                    event.external_transaction_id.clone(),
                )
                .await?;
            let model = self.require_payment_model(&db_tx, &payment_id).await?;
            Ok((Payment::try_from(model)?, transition))
        })
    }

    /// Returns the order state for a client poll.
    ///
    /// A still-pending payment triggers a remote sync first, so polling
    /// clients are not dependent on callback delivery. Gateway trouble
    /// during the sync is logged and the stored state returned; the
    /// payment simply stays `pending` until a later poll or callback.
    pub async fn order_status(&self, payment_id: &str) -> ResultEngine<OrderState> {
        let payment = self.payment(payment_id).await?;
        if payment.status != payments::STATUS_PENDING {
            return Ok(OrderState {
                payment,
                synced: false,
            });
        }

        let Some(external_order_id) = payment.external_order_id.clone() else {
            return Ok(OrderState {
                payment,
                synced: false,
            });
        };
        let Some(gateway_id) = payment.gateway_id.clone() else {
            return Ok(OrderState {
                payment,
                synced: false,
            });
        };

        let remote = match self.fetch_remote_status(&gateway_id, &external_order_id).await {
            Ok(status) => status,
            Err(err) => {
                tracing::warn!(payment_id, error = %err, "gateway status sync failed");
                return Ok(OrderState {
                    payment,
                    synced: false,
                });
            }
        };

        let new_status = remote.as_payment_status();
        if new_status != payment.status {
            with_tx!(self, |db_tx| {
                let model = self.require_payment_model(&db_tx, payment_id).await?;
                self.apply_status_in(&db_tx, model, new_status, None).await?;
                Ok::<(), EngineError>(())
            })?;
        }

        let payment = self.payment(payment_id).await?;
        Ok(OrderState {
            payment,
            synced: true,
        })
    }

    /// Creates one order per card; partial success is reported, not rolled
    /// back.
    pub async fn create_orders_bulk(
        &self,
        garden_id: &str,
        card_ids: &[String],
        description: Option<&str>,
    ) -> ResultEngine<BulkOrderOutcome> {
        let mut results = Vec::with_capacity(card_ids.len());
        let mut success_count = 0;
        let mut failed_count = 0;

        for card_id in card_ids {
            let outcome = self
                .create_card_order_checked(garden_id, card_id, description)
                .await;
            match outcome {
                Ok(order) => {
                    success_count += 1;
                    results.push(CardOrderResult {
                        card_id: card_id.clone(),
                        order: Some(order),
                        error: None,
                    });
                }
                Err(err) => {
                    failed_count += 1;
                    results.push(CardOrderResult {
                        card_id: card_id.clone(),
                        order: None,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        Ok(BulkOrderOutcome {
            results,
            success_count,
            failed_count,
        })
    }

    /// Garden a card belongs to, resolved via its group. Lets callers
    /// enforce ownership before registering a card-targeted order.
    pub async fn card_owner(&self, card_id: &str) -> ResultEngine<String> {
        with_tx!(self, |db_tx| {
            let card = self.require_card(&db_tx, card_id).await?;
            self.card_garden_id(&db_tx, &card).await
        })
    }

    async fn create_card_order_checked(
        &self,
        garden_id: &str,
        card_id: &str,
        description: Option<&str>,
    ) -> ResultEngine<CreatedPaymentOrder> {
        // Ownership check up front; the order itself is card-targeted.
        with_tx!(self, |db_tx| {
            let card = self.require_card(&db_tx, card_id).await?;
            let owner = self.card_garden_id(&db_tx, &card).await?;
            if owner != garden_id {
                return Err(EngineError::OwnershipMismatch(format!(
                    "card {card_id} does not belong to garden {garden_id}"
                )));
            }
            Ok::<(), EngineError>(())
        })?;

        self.create_order(CreateOrderCmd {
            amount: None,
            currency: None,
            garden_id: None,
            card_id: Some(card_id.to_string()),
            gateway_id: None,
            description: description.map(str::to_string),
        })
        .await
    }

    async fn fetch_remote_status(
        &self,
        gateway_id: &str,
        external_order_id: &str,
    ) -> ResultEngine<crate::GatewayStatus> {
        let gateway_model = gateways::Entity::find_by_id(gateway_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("gateway not exists".to_string()))?;
        let kind = GatewayKind::try_from(gateway_model.kind.as_str())?;
        let adapter = self.gateways.get(kind)?;
        Ok(adapter.fetch_status(external_order_id).await?)
    }

    /// One license-year at the tariff of the card's country.
    async fn card_tariff(
        &self,
        db_tx: &sea_orm::DatabaseTransaction,
        card: &crate::cards::Model,
    ) -> ResultEngine<Money> {
        let garden_id = self.card_garden_id(db_tx, card).await?;
        let garden = self.require_garden(db_tx, &garden_id).await?;
        let city = cities::Entity::find_by_id(garden.city_id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("city not exists".to_string()))?;
        let country = countries::Entity::find_by_id(city.country_id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("country not exists".to_string()))?;
        let tariff = Money::new(country.tariff_minor);
        if !tariff.is_positive() {
            return Err(EngineError::NotConfigured(format!(
                "tariff not configured for country {}",
                country.name
            )));
        }
        Ok(tariff)
    }
}
