//! Garden balance endpoints: direct adjustments and the license batch.

use api_types::balance::BalanceAdjust;
use api_types::licenses::{CardActivationView, PayForCards, PayForCardsResponse};
use axum::{
    Extension, Json,
    extract::State,
};

use crate::{ServerError, payments::map_payment, server::ServerState};
use engine::{Actor, AdjustBalanceCmd, EngineError, Money, PayForCardsCmd};

pub async fn adjust_balance(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<BalanceAdjust>,
) -> Result<Json<api_types::payment::PaymentView>, ServerError> {
    // Direct adjustments are a back-office operation.
    if !actor.is_admin() {
        return Err(ServerError::Engine(EngineError::Forbidden(
            "only admins may adjust balances directly".to_string(),
        )));
    }

    let payment = state
        .engine
        .adjust_garden_balance(AdjustBalanceCmd {
            garden_id: payload.garden_id,
            amount: Money::new(payload.amount_minor),
            currency: payload.currency,
            comment: payload.comment,
            status: payload.status,
        })
        .await?;

    Ok(Json(map_payment(payment)))
}

pub async fn pay_for_cards(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<PayForCards>,
) -> Result<Json<PayForCardsResponse>, ServerError> {
    let allowed = match &actor {
        Actor::Admin => true,
        Actor::Garden { garden_id } => garden_id == &payload.garden_id,
        Actor::Dister { .. } => false,
    };
    if !allowed {
        return Err(ServerError::Engine(EngineError::Forbidden(
            "cannot pay for another garden's cards".to_string(),
        )));
    }

    let purchase = state
        .engine
        .pay_for_cards(PayForCardsCmd {
            garden_id: payload.garden_id,
            card_ids: payload.card_ids,
            comment: payload.comment,
        })
        .await?;

    Ok(Json(PayForCardsResponse {
        garden_id: purchase.garden_id,
        tariff_minor: purchase.tariff.minor(),
        total_minor: purchase.total.minor(),
        cards: purchase
            .cards
            .into_iter()
            .map(|card| CardActivationView {
                card_id: card.card_id,
                payment_id: card.payment_id,
                transaction_number: card.transaction_number,
                license_kind: card.license.kind_str().to_string(),
                license_until: card.license_until,
            })
            .collect(),
    }))
}
